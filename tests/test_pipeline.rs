//! Integration test: full pipeline (train -> artifact -> serve)

use polars::prelude::*;
use underwriter::artifact::PipelineArtifact;
use underwriter::inference::{InferenceService, Label};
use underwriter::preprocessing::{FieldValue, Record};
use underwriter::training::{train, TrainConfig};

struct LoanRow {
    id: &'static str,
    income: Option<f64>,
    credit_history: f64,
    area: Option<&'static str>,
    status: &'static str,
}

/// A small loan table with the shape of the real one: an identifier, mixed
/// numeric/categorical features with missing values, and a Y/N label the
/// features mostly explain.
fn loan_rows() -> Vec<LoanRow> {
    let mut rows = Vec::new();
    for i in 0..12 {
        rows.push(LoanRow {
            id: "approved",
            income: if i == 3 { None } else { Some(4500.0 + 150.0 * i as f64) },
            credit_history: 1.0,
            area: if i == 7 { None } else { Some("Urban") },
            status: "Y",
        });
    }
    for i in 0..12 {
        rows.push(LoanRow {
            id: "denied",
            income: if i == 5 { None } else { Some(900.0 + 80.0 * i as f64) },
            credit_history: if i % 3 == 0 { 1.0 } else { 0.0 },
            area: Some(if i % 2 == 0 { "Rural" } else { "Semiurban" }),
            status: "N",
        });
    }
    rows
}

fn loan_frame(rows: &[LoanRow]) -> DataFrame {
    let ids: Vec<String> = rows
        .iter()
        .enumerate()
        .map(|(i, r)| format!("LP{}{:03}", r.id.to_uppercase(), i))
        .collect();
    df!(
        "Loan_ID" => &ids,
        "ApplicantIncome" => &rows.iter().map(|r| r.income).collect::<Vec<_>>(),
        "Credit_History" => &rows.iter().map(|r| r.credit_history).collect::<Vec<_>>(),
        "Property_Area" => &rows.iter().map(|r| r.area).collect::<Vec<_>>(),
        "Loan_Status" => &rows.iter().map(|r| r.status).collect::<Vec<_>>()
    )
    .unwrap()
}

fn loan_record(row: &LoanRow) -> Record {
    let mut r = Record::new();
    r.insert(
        "ApplicantIncome".to_string(),
        row.income.map(FieldValue::Number).unwrap_or(FieldValue::Missing),
    );
    r.insert(
        "Credit_History".to_string(),
        FieldValue::Number(row.credit_history),
    );
    r.insert(
        "Property_Area".to_string(),
        row.area
            .map(|a| FieldValue::Text(a.to_string()))
            .unwrap_or(FieldValue::Missing),
    );
    r
}

fn trained() -> PipelineArtifact {
    let rows = loan_rows();
    let df = loan_frame(&rows);
    train(&df, &TrainConfig::default()).unwrap()
}

#[test]
fn test_train_produces_complete_artifact() {
    let artifact = trained();

    assert_eq!(artifact.evaluations.len(), 3, "one evaluation per candidate");
    for eval in &artifact.evaluations {
        assert_eq!(eval.fold_accuracies.len(), 4);
        assert!((0.0..=1.0).contains(&eval.mean_accuracy));
    }

    let schema = artifact.router.schema().unwrap();
    assert_eq!(
        schema.numeric(),
        &["ApplicantIncome".to_string(), "Credit_History".to_string()]
    );
    assert_eq!(schema.categorical(), &["Property_Area".to_string()]);
    // The identifier column never becomes a feature.
    assert!(!schema.columns().any(|c| c == "Loan_ID"));
}

#[test]
fn test_train_serve_parity_through_deserialized_artifact() {
    let rows = loan_rows();
    let df = loan_frame(&rows);
    let artifact = train(&df, &TrainConfig::default()).unwrap();

    // Labels straight from the freshly trained pair.
    let features = df.drop("Loan_ID").unwrap().drop("Loan_Status").unwrap();
    let x = artifact.router.transform(&features).unwrap();
    let direct = artifact.classifier.predict(&x).unwrap();

    // The same records through a serialize/deserialize cycle.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("loan_pipeline.bin");
    artifact.save(&path).unwrap();
    let service = InferenceService::from_path(&path).unwrap();

    for (i, row) in rows.iter().enumerate() {
        let prediction = service.predict(&loan_record(row)).unwrap();
        let expected = if direct[i] >= 0.5 {
            Label::Approved
        } else {
            Label::Denied
        };
        assert_eq!(prediction.label, expected, "row {} drifted", i);
    }
}

#[test]
fn test_selected_model_fits_training_data() {
    let rows = loan_rows();
    let artifact = trained();
    let service = InferenceService::new(artifact);

    let mut correct = 0;
    for row in &rows {
        let prediction = service.predict(&loan_record(row)).unwrap();
        let expected = if row.status == "Y" {
            Label::Approved
        } else {
            Label::Denied
        };
        if prediction.label == expected {
            correct += 1;
        }
    }
    // The winner is refit on the full training set; it should separate this
    // nearly-separable table well.
    assert!(correct >= 20, "only {}/24 training rows reproduced", correct);
}

#[test]
fn test_unseen_category_tolerated_at_inference() {
    let service = InferenceService::new(trained());

    let mut record = loan_record(&loan_rows()[0]);
    record.insert(
        "Property_Area".to_string(),
        FieldValue::Text("Offworld".to_string()),
    );

    let prediction = service.predict(&record);
    assert!(prediction.is_ok(), "unseen category must not fail");
}

#[test]
fn test_missing_key_fails_and_names_it() {
    let service = InferenceService::new(trained());

    let mut record = loan_record(&loan_rows()[0]);
    record.remove("Credit_History");

    let err = service.predict(&record).unwrap_err();
    assert!(err.to_string().contains("Credit_History"));
}

#[test]
fn test_confidence_is_a_probability() {
    let service = InferenceService::new(trained());
    let prediction = service.predict(&loan_record(&loan_rows()[0])).unwrap();
    assert!((0.5..=1.0).contains(&prediction.confidence));
}

//! Integration tests for the cleaning strategies

use satisfaction_pipeline::cleaning::{
    DataCleaning, DataProcessStrategy, DataSplitStrategy, DIMENSION_COLUMNS, TIMESTAMP_COLUMNS,
};
use satisfaction_pipeline::error::PipelineError;
use polars::prelude::*;

fn create_raw_dataset(n: usize) -> DataFrame {
    let ts = vec!["2018-03-01 08:00:00"; n];
    let weight: Vec<Option<f64>> = (0..n)
        .map(|i| if i % 4 == 1 { None } else { Some(100.0 + (i * 7 % 40) as f64) })
        .collect();
    let length: Vec<Option<f64>> = (0..n)
        .map(|i| if i == 0 { None } else { Some(10.0 + i as f64) })
        .collect();

    df!(
        "order_purchase_timestamp" => ts.clone(),
        "order_approved_at" => ts.clone(),
        "order_delivered_carrier_date" => ts.clone(),
        "order_delivered_customer_date" => ts.clone(),
        "order_estimated_delivery_date" => ts,
        "price" => (0..n).map(|i| 9.9 + i as f64).collect::<Vec<_>>(),
        "product_weight_g" => weight,
        "product_length_cm" => length,
        "product_height_cm" => vec![Some(4.0); n],
        "product_width_cm" => vec![Some(11.0); n],
        "review_comment_message" => (0..n).map(|i| if i % 2 == 0 { None } else { Some("bom") }).collect::<Vec<_>>(),
        "customer_zip_code_prefix" => (0..n as i64).collect::<Vec<_>>(),
        "order_item_id" => vec![1i64; n],
        "review_score" => (0..n as i64).map(|i| 1 + i % 5).collect::<Vec<_>>()
    )
    .unwrap()
}

#[test]
fn test_each_missing_timestamp_column_fails() {
    let df = create_raw_dataset(10);
    for name in TIMESTAMP_COLUMNS {
        let without = df.drop(name).unwrap();
        let result = DataCleaning::new(without, DataProcessStrategy).handle_data();
        assert!(
            matches!(result, Err(PipelineError::FeatureNotFound(ref col)) if col == name),
            "dropping {} should fail",
            name
        );
    }
}

#[test]
fn test_dimension_nulls_filled_with_pre_fill_median() {
    let df = create_raw_dataset(21);
    let medians: Vec<f64> = DIMENSION_COLUMNS
        .iter()
        .map(|name| {
            df.column(name)
                .unwrap()
                .cast(&DataType::Float64)
                .unwrap()
                .f64()
                .unwrap()
                .median()
                .unwrap()
        })
        .collect();

    let cleaned = DataCleaning::new(df.clone(), DataProcessStrategy).handle_data().unwrap();

    for (name, median) in DIMENSION_COLUMNS.iter().zip(medians) {
        let before = df.column(name).unwrap().f64().unwrap();
        let after = cleaned.column(name).unwrap().f64().unwrap();
        assert_eq!(after.null_count(), 0);
        for (b, a) in before.into_iter().zip(after.into_iter()) {
            match b {
                Some(v) => assert_eq!(a, Some(v)),
                None => assert_eq!(a, Some(median)),
            }
        }
    }
}

#[test]
fn test_cleaned_frame_is_numeric_without_identifiers() {
    let cleaned = DataCleaning::new(create_raw_dataset(12), DataProcessStrategy)
        .handle_data()
        .unwrap();

    let names: Vec<String> = cleaned.get_column_names().iter().map(|n| n.to_string()).collect();
    assert!(!names.contains(&"review_comment_message".to_string()));
    assert!(!names.contains(&"customer_zip_code_prefix".to_string()));
    assert!(!names.contains(&"order_item_id".to_string()));
    assert!(names.contains(&"review_score".to_string()));
    assert_eq!(cleaned.height(), 12);
}

#[test]
fn test_split_partitions_and_is_deterministic() {
    for n in [5usize, 9, 10, 33, 100] {
        let cleaned = DataCleaning::new(create_raw_dataset(n), DataProcessStrategy)
            .handle_data()
            .unwrap();

        let a = DataCleaning::new(cleaned.clone(), DataSplitStrategy::default())
            .handle_data()
            .unwrap();
        let b = DataCleaning::new(cleaned, DataSplitStrategy::default())
            .handle_data()
            .unwrap();

        assert_eq!(a.n_train() + a.n_test(), n);
        assert_eq!(a.n_test(), (0.2 * n as f64).ceil() as usize);
        assert_eq!(a.x_train, b.x_train);
        assert_eq!(a.y_test, b.y_test);
    }
}

#[test]
fn test_split_seed_changes_holdout() {
    let cleaned = DataCleaning::new(create_raw_dataset(50), DataProcessStrategy)
        .handle_data()
        .unwrap();

    let a = DataCleaning::new(cleaned.clone(), DataSplitStrategy::new().with_random_state(1))
        .handle_data()
        .unwrap();
    let b = DataCleaning::new(cleaned, DataSplitStrategy::new().with_random_state(2))
        .handle_data()
        .unwrap();
    assert_ne!(a.x_test, b.x_test);
}

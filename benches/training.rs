use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use satisfaction_pipeline::cleaning::{DataCleaning, DataProcessStrategy, DataSplitStrategy};
use satisfaction_pipeline::training::{Hyperparameters, LinearRegressionModel, Model};
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn create_orders_data(n_rows: usize) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut col = |scale: f64| -> Vec<f64> { (0..n_rows).map(|_| rng.gen::<f64>() * scale).collect() };

    let price = col(200.0);
    let freight = col(40.0);
    let length = col(60.0);
    let height = col(30.0);
    let width = col(40.0);
    let weight: Vec<Option<f64>> = col(2000.0)
        .into_iter()
        .enumerate()
        .map(|(i, w)| if i % 50 == 0 { None } else { Some(w) })
        .collect();
    let score: Vec<i64> = price.iter().map(|p| 1 + (*p as i64 % 5)).collect();
    let ts = vec!["2017-10-02 10:56:33"; n_rows];

    df!(
        "order_purchase_timestamp" => ts.clone(),
        "order_approved_at" => ts.clone(),
        "order_delivered_carrier_date" => ts.clone(),
        "order_delivered_customer_date" => ts.clone(),
        "order_estimated_delivery_date" => ts,
        "price" => price,
        "freight_value" => freight,
        "product_weight_g" => weight,
        "product_length_cm" => length,
        "product_height_cm" => height,
        "product_width_cm" => width,
        "review_comment_message" => vec![None::<&str>; n_rows],
        "customer_zip_code_prefix" => (0..n_rows as i64).collect::<Vec<_>>(),
        "order_item_id" => vec![1i64; n_rows],
        "review_score" => score
    )
    .unwrap()
}

fn bench_cleaning(c: &mut Criterion) {
    let mut group = c.benchmark_group("cleaning");

    for n_rows in [1000, 10000, 100000].iter() {
        let df = create_orders_data(*n_rows);

        group.bench_with_input(BenchmarkId::new("process_and_split", n_rows), &df, |b, df| {
            b.iter(|| {
                let cleaned = DataCleaning::new(black_box(df).clone(), DataProcessStrategy)
                    .handle_data()
                    .unwrap();
                DataCleaning::new(cleaned, DataSplitStrategy::default())
                    .handle_data()
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10);

    for n_rows in [1000, 10000, 100000].iter() {
        let cleaned = DataCleaning::new(create_orders_data(*n_rows), DataProcessStrategy)
            .handle_data()
            .unwrap();
        let split = DataCleaning::new(cleaned, DataSplitStrategy::default())
            .handle_data()
            .unwrap();
        let params = Hyperparameters::new();

        group.bench_with_input(BenchmarkId::new("fit", n_rows), &split, |b, split| {
            b.iter(|| {
                LinearRegressionModel
                    .train(black_box(&split.x_train), black_box(&split.y_train), &params)
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cleaning, bench_training);
criterion_main!(benches);

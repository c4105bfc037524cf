use std::sync::LazyLock;

use prometheus::*;

static METRIC_INGEST_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!("objectx_ingest_count", "count of the ingested uploads", &["result"])
        .unwrap()
});

static METRIC_INGEST_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!("objectx_ingest_duration", "duration of the per-upload ingestion in seconds")
        .unwrap()
});

static METRIC_STORE_OP_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "objectx_store_op_count",
        "count of the metadata store operations",
        &["op"]
    )
    .unwrap()
});

/// 记录一次上传的处理结果和耗时
pub fn inc_ingest(result: &str, duration: f32) {
    METRIC_INGEST_COUNT.with_label_values(&[result]).inc();
    METRIC_INGEST_DURATION.observe(duration as f64);
}

pub fn inc_store_op(op: &str) {
    METRIC_STORE_OP_COUNT.with_label_values(&[op]).inc();
}

/// 以 prometheus 文本格式导出所有指标
pub fn gather_text() -> Result<String> {
    let mut buffer = String::new();
    TextEncoder::new().encode_utf8(&prometheus::gather(), &mut buffer)?;
    Ok(buffer)
}

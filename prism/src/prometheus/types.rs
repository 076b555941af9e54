use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{PrismError, PrismResult};

/// Response envelope returned by the Prometheus HTTP API.
///
/// Successful responses carry `data`; rejected queries carry `errorType` and
/// `error` with `status` set to `"error"`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub status: String,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default, rename = "errorType")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Raw `[timestamp, "value"]` pair as serialized by the backend. Values are
/// strings on the wire to preserve float precision.
pub(crate) type RawSample = (f64, String);

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RangeData {
    #[serde(default)]
    pub result: Vec<RawSeries>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSeries {
    #[serde(default)]
    pub metric: BTreeMap<String, String>,
    #[serde(default)]
    pub values: Vec<RawSample>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct InstantData {
    #[serde(default)]
    pub result: Vec<RawInstant>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawInstant {
    #[serde(default)]
    pub metric: BTreeMap<String, String>,
    pub value: RawSample,
}

/// A single decoded sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Unix timestamp in seconds.
    pub timestamp: i64,
    pub value: f64,
}

/// A labeled series of samples, as returned by a range query.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    pub labels: BTreeMap<String, String>,
    pub samples: Vec<Sample>,
}

/// The result of a range query.
pub type Matrix = Vec<TimeSeries>;

/// A labeled single sample, as returned by an instant query.
#[derive(Debug, Clone)]
pub struct InstantSample {
    pub labels: BTreeMap<String, String>,
    pub sample: Sample,
}

/// The result of an instant query.
pub type Vector = Vec<InstantSample>;

fn parse_sample(raw: &RawSample) -> PrismResult<Sample> {
    let value = raw.1.parse::<f64>().map_err(|e| PrismError::Sample {
        detail: format!("invalid sample value `{}`: {e}", raw.1),
    })?;

    Ok(Sample {
        timestamp: raw.0 as i64,
        value,
    })
}

impl TryFrom<RawSeries> for TimeSeries {
    type Error = PrismError;

    fn try_from(raw: RawSeries) -> PrismResult<Self> {
        let samples = raw
            .values
            .iter()
            .map(parse_sample)
            .collect::<PrismResult<Vec<_>>>()?;

        Ok(TimeSeries {
            labels: raw.metric,
            samples,
        })
    }
}

impl TryFrom<RawInstant> for InstantSample {
    type Error = PrismError;

    fn try_from(raw: RawInstant) -> PrismResult<Self> {
        Ok(InstantSample {
            sample: parse_sample(&raw.value)?,
            labels: raw.metric,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_payload_is_decoded() {
        let payload = r#"{
            "status": "success",
            "data": {
                "resultType": "matrix",
                "result": [
                    {
                        "metric": {"pod": "web-0"},
                        "values": [[1700000000, "0.25"], [1700000015, "0.5"]]
                    }
                ]
            }
        }"#;

        let envelope: ApiResponse<RangeData> = serde_json::from_str(payload).unwrap();
        assert_eq!(envelope.status, "success");

        let data = envelope.data.unwrap();
        let series = TimeSeries::try_from(data.result.into_iter().next().unwrap()).unwrap();
        assert_eq!(series.labels.get("pod").map(String::as_str), Some("web-0"));
        assert_eq!(
            series.samples,
            vec![
                Sample {
                    timestamp: 1700000000,
                    value: 0.25
                },
                Sample {
                    timestamp: 1700000015,
                    value: 0.5
                }
            ]
        );
    }

    #[test]
    fn error_envelope_is_decoded() {
        let payload = r#"{
            "status": "error",
            "errorType": "bad_data",
            "error": "invalid parameter"
        }"#;

        let envelope: ApiResponse<RangeData> = serde_json::from_str(payload).unwrap();
        assert_eq!(envelope.status, "error");
        assert_eq!(envelope.error_type.as_deref(), Some("bad_data"));
        assert!(envelope.data.is_none());
    }

    #[test]
    fn malformed_sample_value_is_rejected() {
        let raw = RawSeries {
            metric: BTreeMap::new(),
            values: vec![(1700000000.0, "NaN-ish".to_string())],
        };

        let error = TimeSeries::try_from(raw).unwrap_err();
        assert!(matches!(error, PrismError::Sample { .. }));
    }
}

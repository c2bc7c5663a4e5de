//! EVE 이벤트 파서 — 원시 JSON 라인을 canonical [`Alert`]로 정규화합니다.
//!
//! 입력은 JSON 객체로 추정되는 한 줄의 텍스트이며, 출력은 미영속
//! `Alert` 또는 부작용 없는 거부([`ParseRejection`])입니다.
//!
//! # 거부 정책
//! - 잘못된 JSON → 조용히 거부 (로그만, 파이프라인 실패 아님)
//! - `event_type != "alert"` → 조용히 거부 (flow, dns 등은 범위 밖)
//!
//! # 필드 기본값 정책
//! - 숫자 필드 결측 → 0, 문자열 필드 결측 → 빈 문자열
//! - 타임스탬프 파싱 실패 → 수집 시각으로 대체 (거부하지 않음)
//! - 심각도 코드: 1→High, 2→Medium, 3→Low, 그 외(결측 포함)→Medium

use chrono::{DateTime, Utc};
use serde::Deserialize;

use netwarden_core::types::{Alert, Severity};

use crate::tailer::RawLine;

/// 파서 거부 사유
///
/// 거부는 에러가 아니라 정상 경로입니다. 소스 로그에는 alert 외의
/// 이벤트 타입이 섞여 있으며, 손상된 라인도 스트림을 멈추지 않습니다.
#[derive(Debug, thiserror::Error)]
pub enum ParseRejection {
    /// JSON 파싱 실패
    #[error("malformed json: {0}")]
    Malformed(String),

    /// alert가 아닌 이벤트 타입
    #[error("not an alert event: event_type '{0}'")]
    NotAlert(String),
}

/// EVE 레코드의 와이어 형식
#[derive(Debug, Deserialize)]
struct EveRecord {
    #[serde(default)]
    event_type: String,
    #[serde(default)]
    timestamp: String,
    #[serde(default)]
    src_ip: String,
    #[serde(default)]
    dest_ip: String,
    #[serde(default)]
    src_port: u16,
    #[serde(default)]
    dest_port: u16,
    #[serde(default)]
    proto: String,
    #[serde(default)]
    alert: EveAlertBody,
    payload: Option<String>,
}

/// EVE 레코드의 중첩 `alert` 객체
#[derive(Debug, Default, Deserialize)]
struct EveAlertBody {
    #[serde(default)]
    signature: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    signature_id: u64,
    #[serde(default)]
    gid: u64,
    #[serde(default)]
    action: String,
    severity: Option<i64>,
}

/// EVE 파서
#[derive(Debug, Clone, Default)]
pub struct EveParser;

impl EveParser {
    /// 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self
    }

    /// 원시 라인을 파싱하여 미영속 `Alert`를 생성합니다.
    pub fn parse(&self, raw: &RawLine) -> Result<Alert, ParseRejection> {
        let record: EveRecord = serde_json::from_slice(&raw.data)
            .map_err(|e| ParseRejection::Malformed(e.to_string()))?;

        if record.event_type != "alert" {
            return Err(ParseRejection::NotAlert(record.event_type));
        }

        let timestamp = parse_timestamp(&record.timestamp).unwrap_or(raw.received_at);

        Ok(Alert {
            id: None,
            timestamp,
            source_ip: record.src_ip,
            dest_ip: record.dest_ip,
            source_port: record.src_port,
            dest_port: record.dest_port,
            protocol: record.proto,
            signature: record.alert.signature,
            category: record.alert.category,
            severity: Severity::from_eve_code(record.alert.severity.unwrap_or(2)),
            signature_id: record.alert.signature_id,
            generator_id: record.alert.gid,
            action: record.alert.action,
            payload: record.payload,
            device: None,
            search_id: None,
        })
    }
}

/// ISO 8601 오프셋 포함 타임스탬프를 파싱합니다.
///
/// Suricata는 `2024-01-01T10:00:00.123456+0000` 형식(콜론 없는 오프셋)을
/// 쓰므로 RFC 3339 실패 시 해당 형식을 추가로 시도합니다.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z")
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ALERT_LINE: &str = r#"{"event_type":"alert","timestamp":"2024-01-01T10:00:00Z","src_ip":"1.2.3.4","dest_ip":"5.6.7.8","src_port":443,"dest_port":51000,"proto":"TCP","alert":{"signature":"ET SCAN","category":"scan","signature_id":123,"gid":1,"action":"allowed","severity":2}}"#;

    #[test]
    fn parses_well_formed_alert() {
        let parser = EveParser::new();
        let alert = parser.parse(&RawLine::from(ALERT_LINE)).unwrap();
        assert_eq!(alert.id, None);
        assert_eq!(alert.source_ip, "1.2.3.4");
        assert_eq!(alert.dest_ip, "5.6.7.8");
        assert_eq!(alert.source_port, 443);
        assert_eq!(alert.dest_port, 51000);
        assert_eq!(alert.protocol, "TCP");
        assert_eq!(alert.signature, "ET SCAN");
        assert_eq!(alert.category, "scan");
        assert_eq!(alert.severity, Severity::Medium);
        assert_eq!(alert.signature_id, 123);
        assert_eq!(alert.generator_id, 1);
        assert_eq!(alert.action, "allowed");
        assert_eq!(
            alert.timestamp,
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
        );
        assert!(alert.payload.is_none());
        assert!(alert.device.is_none());
        assert!(alert.search_id.is_none());
    }

    #[test]
    fn rejects_malformed_json() {
        let parser = EveParser::new();
        let result = parser.parse(&RawLine::from("{not json"));
        assert!(matches!(result, Err(ParseRejection::Malformed(_))));
    }

    #[test]
    fn rejects_non_alert_event_type() {
        let parser = EveParser::new();
        let line = r#"{"event_type":"flow","src_ip":"1.1.1.1"}"#;
        let result = parser.parse(&RawLine::from(line));
        match result {
            Err(ParseRejection::NotAlert(event_type)) => assert_eq!(event_type, "flow"),
            other => panic!("expected NotAlert, got {other:?}"),
        }
    }

    #[test]
    fn rejects_missing_event_type() {
        let parser = EveParser::new();
        let result = parser.parse(&RawLine::from(r#"{"src_ip":"1.1.1.1"}"#));
        assert!(matches!(result, Err(ParseRejection::NotAlert(_))));
    }

    #[test]
    fn severity_mapping_table() {
        let parser = EveParser::new();
        for (code, expected) in [
            (1, Severity::High),
            (2, Severity::Medium),
            (3, Severity::Low),
            (0, Severity::Medium),
            (99, Severity::Medium),
        ] {
            let line = format!(
                r#"{{"event_type":"alert","alert":{{"severity":{code}}}}}"#
            );
            let alert = parser.parse(&RawLine::from(line.as_str())).unwrap();
            assert_eq!(alert.severity, expected, "code {code}");
        }
    }

    #[test]
    fn absent_severity_defaults_to_medium() {
        let parser = EveParser::new();
        let alert = parser
            .parse(&RawLine::from(r#"{"event_type":"alert","alert":{}}"#))
            .unwrap();
        assert_eq!(alert.severity, Severity::Medium);
    }

    #[test]
    fn absent_fields_get_defaults() {
        let parser = EveParser::new();
        let alert = parser
            .parse(&RawLine::from(r#"{"event_type":"alert"}"#))
            .unwrap();
        assert_eq!(alert.source_ip, "");
        assert_eq!(alert.dest_ip, "");
        assert_eq!(alert.source_port, 0);
        assert_eq!(alert.dest_port, 0);
        assert_eq!(alert.signature, "");
        assert_eq!(alert.signature_id, 0);
        assert_eq!(alert.generator_id, 0);
    }

    #[test]
    fn unparsable_timestamp_falls_back_to_ingestion_time() {
        let parser = EveParser::new();
        let raw = RawLine::from(
            r#"{"event_type":"alert","timestamp":"not-a-timestamp","alert":{}}"#,
        );
        let ingested = raw.received_at;
        let alert = parser.parse(&raw).unwrap();
        assert_eq!(alert.timestamp, ingested);
    }

    #[test]
    fn absent_timestamp_falls_back_to_ingestion_time() {
        let parser = EveParser::new();
        let raw = RawLine::from(r#"{"event_type":"alert","alert":{}}"#);
        let ingested = raw.received_at;
        let alert = parser.parse(&raw).unwrap();
        assert_eq!(alert.timestamp, ingested);
    }

    #[test]
    fn parses_suricata_offset_without_colon() {
        let parsed = parse_timestamp("2024-01-01T10:00:00.123456+0000").unwrap();
        assert_eq!(parsed.date_naive().to_string(), "2024-01-01");
    }

    #[test]
    fn payload_copied_verbatim() {
        let parser = EveParser::new();
        let line = r#"{"event_type":"alert","alert":{},"payload":"R0VUIC8gSFRUUC8xLjE="}"#;
        let alert = parser.parse(&RawLine::from(line)).unwrap();
        assert_eq!(alert.payload.as_deref(), Some("R0VUIC8gSFRUUC8xLjE="));
    }

    #[test]
    fn rejection_has_no_side_effects_and_is_repeatable() {
        let parser = EveParser::new();
        let raw = RawLine::from("{broken");
        assert!(parser.parse(&raw).is_err());
        assert!(parser.parse(&raw).is_err());
    }
}

//! 캐시 판정
//!
//! 이전 실행이 저장한 지문과 현재 도구의 지문을 바이트 단위로 비교합니다.
//! 지문이 없거나 다르면 재빌드입니다.

use std::fmt;

use metrics::counter;
use tracing::info;

use modbom_core::metrics::{CACHE_DECISIONS_TOTAL, LABEL_RESULT};

/// 캐시 판정 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDecision {
    /// 기존 레이어 재사용
    Reuse,
    /// 레이어 초기화 후 재구성
    Rebuild,
}

impl CacheDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reuse => "reuse",
            Self::Rebuild => "rebuild",
        }
    }
}

impl fmt::Display for CacheDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 저장된 지문과 현재 지문으로 재사용 여부를 판정합니다.
pub fn decide(stored: Option<&str>, current: &str) -> CacheDecision {
    let decision = match stored {
        Some(stored) if stored.as_bytes() == current.as_bytes() => CacheDecision::Reuse,
        _ => CacheDecision::Rebuild,
    };

    match decision {
        CacheDecision::Reuse => info!(fingerprint = current, "Reusing cached layer"),
        CacheDecision::Rebuild => info!(
            stored = stored.unwrap_or("<none>"),
            current, "Executing build process"
        ),
    }
    counter!(CACHE_DECISIONS_TOTAL, LABEL_RESULT => decision.as_str()).increment(1);

    decision
}

//! 품사 유니그램/전이 확률 모델
//!
//! # 파일 형식 (탭 구분)
//! ```text
//! VV		12345        ← 유니그램 (두 번째 열 비움): 품사, 빈도
//! VV	EC	0.42         ← 전이: 앞 품사, 뒤 품사, 확률
//! EF	^	0.97         ← `^`는 문장 끝
//! ```

use std::fs;
use std::path::Path;

use rustc_hash::FxHashMap;

use crate::config::PosConfig;
use crate::error::{CombineError, Result};

/// 문장 끝 가상 품사
pub const END_TAG: &str = "$";
/// 파일에서 문장 끝을 나타내는 별칭
const END_ALIAS: &str = "^";

/// 품사 전이 모델
#[derive(Debug, Clone, Default)]
pub struct PosModel {
    /// 품사 -> 정규화된 유니그램 확률
    unigram: FxHashMap<String, f64>,
    /// 앞 품사 -> [(뒤 품사, 확률)] (파일 순서)
    transition: FxHashMap<String, Vec<(String, f64)>>,
}

impl PosModel {
    /// 전이 모델 파일 로드
    pub fn load(path: impl AsRef<Path>, config: &PosConfig) -> Result<Self> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|e| CombineError::io(name.clone(), e))?;
        let model = Self::parse_named(&text, &name, config)?;
        log::info!(
            "품사 모델 로드: {} (품사 {}개, 전이 {}개)",
            name,
            model.unigram.len(),
            model.transition.values().map(Vec::len).sum::<usize>()
        );
        Ok(model)
    }

    pub fn parse(text: &str, config: &PosConfig) -> Result<Self> {
        Self::parse_named(text, "<memory>", config)
    }

    fn parse_named(text: &str, name: &str, config: &PosConfig) -> Result<Self> {
        let mut model = Self::default();
        for (no, line) in text.lines().enumerate() {
            // 유니그램 줄의 빈 둘째 열을 지키기 위해 줄 끝만 정리
            let fields: Vec<&str> = line.trim_end().split('\t').collect();
            if fields.len() < 3 {
                continue;
            }
            let value: f64 = fields[2]
                .trim()
                .parse()
                .map_err(|e| CombineError::parse(name, no + 1, format!("{:?}: {}", fields[2], e)))?;

            let (from, to) = (fields[0].trim(), fields[1].trim());
            if to.is_empty() {
                model.unigram.insert(from.to_owned(), value);
                continue;
            }
            if value < config.min_transition {
                continue;
            }
            let to = if to == END_ALIAS { END_TAG } else { to };
            let row = model.transition.entry(from.to_owned()).or_default();
            match row.iter_mut().find(|(t, _)| t == to) {
                Some(entry) => entry.1 = value,
                None => row.push((to.to_owned(), value)),
            }
        }

        let total: f64 = model.unigram.values().sum();
        if total > 0.0 {
            for p in model.unigram.values_mut() {
                *p /= total;
            }
        }
        Ok(model)
    }

    /// 정규화된 유니그램 확률 (없는 품사는 0)
    pub fn unigram(&self, tag: &str) -> f64 {
        self.unigram.get(tag).copied().unwrap_or(0.0)
    }

    /// 앞 품사에서 나가는 전이 목록
    pub fn transitions(&self, from: &str) -> &[(String, f64)] {
        self.transition.get(from).map(Vec::as_slice).unwrap_or(&[])
    }
}

//! 형태소별 끝소리 특징 모델
//!
//! # 파일 형식 (탭 구분, 기본 배치)
//! ```text
//! 형태  품사  빈도  (기타)  p_vowel  p_vocalic  p_vocalic_h  ...
//! 는    ETM   1520  0.3     0.97     0.98       0.98         0.41
//! ```
//! 확률은 앞 형태소가 모음(받침 없음), 모음/ㄹ, 모음/ㄹ/ㅎ으로 끝난 비율입니다.
//! 빈도 열과 확률 첫 열 위치는 `MorphemeConfig` 로 바꿀 수 있습니다.

use std::fs;
use std::path::Path;

use rustc_hash::FxHashMap;

use crate::config::MorphemeConfig;
use crate::core::phonology::Gate;
use crate::error::{CombineError, Result};

/// 어미/조사/지정사 품사 접두어
const ENDING_TAG_PREFIXES: [&str; 3] = ["E", "J", "VC"];

/// (형태, 품사) 키
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MorphemeKey {
    pub form: String,
    pub tag: String,
}

impl MorphemeKey {
    pub fn new(form: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            form: form.into(),
            tag: tag.into(),
        }
    }
}

/// 형태소 하나의 특징
#[derive(Debug, Clone, PartialEq)]
pub struct MorphemeFeatures {
    pub count: f64,
    pub p_vowel: f64,
    pub p_vocalic: f64,
    pub p_vocalic_h: f64,
    /// 앞 어간에 요구하는 끝소리 조건
    pub gate: Option<Gate>,
}

/// 형태소 모델
#[derive(Debug, Clone, Default)]
pub struct MorphemeModel {
    morphemes: FxHashMap<MorphemeKey, MorphemeFeatures>,
    /// 품사 -> 형태 목록 (로드 순서)
    index: FxHashMap<String, Vec<String>>,
}

/// 설정된 배치에서 필요한 최소 열 수
fn required_fields(config: &MorphemeConfig) -> usize {
    let probs = config.probability_column + 3;
    config.count_column.map_or(probs, |c| probs.max(c + 1)).max(2)
}

fn parse_number(value: &str, file: &str, line: usize) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|e| CombineError::parse(file, line, format!("{:?}: {}", value, e)))
}

impl MorphemeModel {
    /// 형태소 모델 파일 로드
    pub fn load(path: impl AsRef<Path>, config: &MorphemeConfig) -> Result<Self> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|e| CombineError::io(name.clone(), e))?;
        let model = Self::parse_named(&text, &name, config)?;
        log::info!("형태소 모델 로드: {} ({}개)", name, model.len());
        Ok(model)
    }

    /// 문자열에서 모델 로드
    pub fn parse(text: &str, config: &MorphemeConfig) -> Result<Self> {
        Self::parse_named(text, "<memory>", config)
    }

    fn parse_named(text: &str, name: &str, config: &MorphemeConfig) -> Result<Self> {
        let mut model = Self::default();
        for (no, line) in text.lines().enumerate() {
            let fields: Vec<&str> = line.trim().split('\t').collect();
            if fields.len() < required_fields(config) {
                if !line.trim().is_empty() {
                    log::debug!("{}:{} 열 수 부족, 무시", name, no + 1);
                }
                continue;
            }
            let (form, tag) = (fields[0], fields[1]);
            if !config_accepts(config, form, tag) {
                continue;
            }
            let key = MorphemeKey::new(form, tag);
            if model.morphemes.contains_key(&key) {
                continue;
            }

            let count = match config.count_column {
                Some(col) => parse_number(fields[col], name, no + 1)?,
                None => 0.0,
            };
            if config.count_column.is_some() && count < config.min_count {
                continue;
            }
            let col = config.probability_column;
            let p_vowel = parse_number(fields[col], name, no + 1)?;
            let p_vocalic = parse_number(fields[col + 1], name, no + 1)?;
            let p_vocalic_h = parse_number(fields[col + 2], name, no + 1)?;
            let gate = Gate::classify(p_vowel, p_vocalic, p_vocalic_h, config.gate_threshold);

            model.index.entry(key.tag.clone()).or_default().push(key.form.clone());
            model.morphemes.insert(
                key,
                MorphemeFeatures {
                    count,
                    p_vowel,
                    p_vocalic,
                    p_vocalic_h,
                    gate,
                },
            );
        }
        Ok(model)
    }

    /// 품사별 형태 목록 (없으면 빈 목록)
    pub fn forms_by_tag(&self, tag: &str) -> &[String] {
        self.index.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn features(&self, form: &str, tag: &str) -> Option<&MorphemeFeatures> {
        self.morphemes.get(&MorphemeKey::new(form, tag))
    }

    /// 형태소의 끝소리 조건
    pub fn gate(&self, form: &str, tag: &str) -> Option<Gate> {
        self.features(form, tag).and_then(|f| f.gate)
    }

    pub fn len(&self) -> usize {
        self.morphemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.morphemes.is_empty()
    }
}

fn config_accepts(config: &MorphemeConfig, form: &str, tag: &str) -> bool {
    if !config.endings_only {
        return true;
    }
    if !ENDING_TAG_PREFIXES.iter().any(|p| tag.starts_with(p)) {
        return false;
    }
    !(tag.starts_with('E')
        && config
            .excluded_ending_prefixes
            .iter()
            .any(|p| !p.is_empty() && form.starts_with(p.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "는\tETM\t1520\t0.3\t0.97\t0.97\t0.97\t0.41\n\
                          은\tETM\t1300\t0.2\t0.02\t0.03\t0.05\t0.5\n\
                          고\tEC\t3000\t0.1\t0.5\t0.6\t0.6\t0.5\n\
                          아서\tEC\t500\t0.1\t0.5\t0.5\t0.5\t0.9\n\
                          는\tETM\t10\t0.1\t0.1\t0.1\t0.1\t0.1\n\
                          이\tJKS\t900\t0.4\t0.01\t0.02\t0.02\t0.5\n\
                          이\tVCP\t800\t0.4\t0.5\t0.5\t0.5\t0.5\n\
                          먹\tVV\t700\t0.1\t0.5\t0.5\t0.5\t0.5\n\
                          \n";

    #[test]
    fn test_load_and_index() {
        let model = MorphemeModel::parse(SAMPLE, &MorphemeConfig::default()).unwrap();
        assert_eq!(model.forms_by_tag("ETM"), ["는", "은"]);
        assert_eq!(model.forms_by_tag("EC"), ["고"]);
        assert_eq!(model.forms_by_tag("JKS"), ["이"]);
        assert_eq!(model.forms_by_tag("VCP"), ["이"]);
        // 어미 모드에서는 용언 제외
        assert!(model.forms_by_tag("VV").is_empty());
        assert!(model.forms_by_tag("XX").is_empty());
    }

    #[test]
    fn test_first_occurrence_wins() {
        let model = MorphemeModel::parse(SAMPLE, &MorphemeConfig::default()).unwrap();
        let f = model.features("는", "ETM").unwrap();
        assert!((f.count - 1520.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_gate_classification() {
        let model = MorphemeModel::parse(SAMPLE, &MorphemeConfig::default()).unwrap();
        assert_eq!(model.gate("는", "ETM"), Some(Gate::IsVowel));
        assert_eq!(model.gate("은", "ETM"), Some(Gate::NotVowel));
        assert_eq!(model.gate("고", "EC"), None);
    }

    #[test]
    fn test_exclusion_options() {
        let all = MorphemeConfig::new().with_excluded_ending_prefixes(vec![]);
        let model = MorphemeModel::parse(SAMPLE, &all).unwrap();
        assert_eq!(model.forms_by_tag("EC"), ["고", "아서"]);

        let everything = MorphemeConfig::new().with_endings_only(false);
        let model = MorphemeModel::parse(SAMPLE, &everything).unwrap();
        assert_eq!(model.forms_by_tag("VV"), ["먹"]);
    }

    #[test]
    fn test_probability_column_default() {
        // 기본 배치에서 빈도 다음 열은 확률이 아님
        let model = MorphemeModel::parse("는\tETM\t10\t0.97\t0.02\t0.02\t0.02\n", &MorphemeConfig::default()).unwrap();
        let f = model.features("는", "ETM").unwrap();
        assert!((f.p_vowel - 0.02).abs() < 1e-9);
        assert_eq!(f.gate, Some(Gate::NotVowel));
    }

    #[test]
    fn test_count_then_probabilities_layout() {
        // 형태 품사 빈도 p_vowel p_vocalic p_vocalic_h p_positive 품사:비율...
        let config = MorphemeConfig::new().with_columns(Some(2), 3);
        let text = "는\tETM\t1520\t0.97\t0.97\t0.97\t0.41\tVV:0.7\n\
                    은\tETM\t1300\t0.02\t0.03\t0.05\t0.5\n";
        let model = MorphemeModel::parse(text, &config).unwrap();
        assert_eq!(model.gate("는", "ETM"), Some(Gate::IsVowel));
        assert_eq!(model.gate("은", "ETM"), Some(Gate::NotVowel));
        assert!((model.features("은", "ETM").unwrap().count - 1300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_probabilities_only_layout() {
        // 형태 품사 p_vowel p_vocalic p_vocalic_h ... (빈도 열 없음)
        let config = MorphemeConfig {
            min_count: 100.0,
            ..MorphemeConfig::new().with_columns(None, 2)
        };
        let model = MorphemeModel::parse("는\tETM\t0.97\t0.97\t0.97\tVV:1\n을\tETM\t0.01\t0.9\t0.9\n", &config).unwrap();
        assert_eq!(model.gate("는", "ETM"), Some(Gate::IsVowel));
        assert_eq!(model.gate("을", "ETM"), Some(Gate::NotVowel));
        // 빈도 열이 없으면 min_count 로 거르지 않음
        assert_eq!(model.len(), 2);
    }

    #[test]
    fn test_min_count() {
        let config = MorphemeConfig {
            min_count: 1000.0,
            ..MorphemeConfig::default()
        };
        let model = MorphemeModel::parse(SAMPLE, &config).unwrap();
        assert_eq!(model.forms_by_tag("ETM"), ["는", "은"]);
        assert_eq!(model.forms_by_tag("EC"), ["고"]);
        assert!(model.forms_by_tag("VCP").is_empty());
    }

    #[test]
    fn test_threshold_is_configurable() {
        let strict = MorphemeConfig::new().with_gate_threshold(0.99);
        let model = MorphemeModel::parse(SAMPLE, &strict).unwrap();
        assert_eq!(model.gate("는", "ETM"), None);
    }

    #[test]
    fn test_bad_number_is_error() {
        let result = MorphemeModel::parse("는\tETM\t1\t0\tx\t0.1\t0.1\n", &MorphemeConfig::default());
        assert!(matches!(result, Err(CombineError::Parse { line: 1, .. })));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.txt");
        fs::write(&path, SAMPLE).unwrap();
        let model = MorphemeModel::load(&path, &MorphemeConfig::default()).unwrap();
        assert_eq!(model.len(), 5);
        assert!(matches!(
            MorphemeModel::load(dir.path().join("none.txt"), &MorphemeConfig::default()),
            Err(CombineError::Io { .. })
        ));
    }
}

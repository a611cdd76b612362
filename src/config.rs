//! 생성기 설정 로드/저장 (JSON)
//!
//! 모든 필드에 기본값이 있으므로 일부 항목만 적은 설정 파일도 읽을 수 있습니다.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{CombineError, Result};

/// 전체 설정
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct CombinerConfig {
    #[serde(default)]
    pub morpheme: MorphemeConfig,
    #[serde(default)]
    pub pos: PosConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub rules: RuleConfig,
    #[serde(default)]
    pub preconditions: PreconditionConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// 형태소 모델 설정
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MorphemeConfig {
    /// 끝소리 조건을 붙이는 최소 확률
    #[serde(default = "default_gate_threshold")]
    pub gate_threshold: f64,
    /// 어미(E*), 조사(J*), 지정사(VC*)만 로드
    #[serde(default = "default_endings_only")]
    pub endings_only: bool,
    /// 이 접두어로 시작하는 어미는 로드하지 않음 (endings_only일 때)
    #[serde(default = "default_excluded_ending_prefixes")]
    pub excluded_ending_prefixes: Vec<String>,
    /// 최소 출현 빈도
    #[serde(default)]
    pub min_count: f64,
    /// 빈도 열 위치 (없으면 빈도 검사 안 함)
    #[serde(default = "default_count_column")]
    pub count_column: Option<usize>,
    /// 끝소리 확률 3개 (모음, 모음/ㄹ, 모음/ㄹ/ㅎ) 중 첫 열 위치
    #[serde(default = "default_probability_column")]
    pub probability_column: usize,
}

fn default_gate_threshold() -> f64 {
    0.93
}

fn default_endings_only() -> bool {
    true
}

fn default_excluded_ending_prefixes() -> Vec<String> {
    vec!["아".to_owned()]
}

fn default_count_column() -> Option<usize> {
    Some(2)
}

/// `형태 품사 빈도 (기타) p_vowel p_vocalic p_vocalic_h ...`
fn default_probability_column() -> usize {
    4
}

impl Default for MorphemeConfig {
    fn default() -> Self {
        Self {
            gate_threshold: default_gate_threshold(),
            endings_only: default_endings_only(),
            excluded_ending_prefixes: default_excluded_ending_prefixes(),
            min_count: 0.0,
            count_column: default_count_column(),
            probability_column: default_probability_column(),
        }
    }
}

impl MorphemeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 끝소리 조건 임계값 설정
    pub fn with_gate_threshold(mut self, threshold: f64) -> Self {
        self.gate_threshold = threshold;
        self
    }

    /// 제외할 어미 접두어 설정
    pub fn with_excluded_ending_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.excluded_ending_prefixes = prefixes;
        self
    }

    /// 품사 필터 사용 여부
    pub fn with_endings_only(mut self, endings_only: bool) -> Self {
        self.endings_only = endings_only;
        self
    }

    /// 열 배치 설정
    pub fn with_columns(mut self, count_column: Option<usize>, probability_column: usize) -> Self {
        self.count_column = count_column;
        self.probability_column = probability_column;
        self
    }
}

/// 품사 전이 모델 설정
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct PosConfig {
    /// 이보다 작은 전이 확률은 버림
    pub min_transition: f64,
}

impl Default for PosConfig {
    fn default() -> Self {
        Self { min_transition: 0.001 }
    }
}

/// 어미열 뒤에 덧붙이는 한 단계 체인 (예: NP 뒤 조사)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ExtraChain {
    pub source: String,
    pub dest_prefix: String,
}

/// 어미열 탐색 설정
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ChainConfig {
    /// 탐색 시작 어근 품사
    pub seeds: Vec<String>,
    /// 어근 + 어미열 최대 길이
    pub max_depth: usize,
    /// 누적 확률 하한
    pub epsilon: f64,
    /// 어미 품사 접두어
    pub ending_prefix: String,
    pub extra_chains: Vec<ExtraChain>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            seeds: ["VV", "VA", "VX", "VCP", "VCN", "XSV", "XSA"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            max_depth: 8,
            epsilon: 3e-5,
            ending_prefix: "E".to_owned(),
            extra_chains: vec![
                ExtraChain {
                    source: "NP".to_owned(),
                    dest_prefix: "J".to_owned(),
                },
                ExtraChain {
                    source: "NNB".to_owned(),
                    dest_prefix: "VCP".to_owned(),
                },
            ],
        }
    }
}

impl ChainConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seeds(mut self, seeds: &[&str]) -> Self {
        self.seeds = seeds.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_extra_chains(mut self, extra: Vec<ExtraChain>) -> Self {
        self.extra_chains = extra;
        self
    }
}

/// 결합 규칙 설정
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct RuleConfig {
    /// 앞 품사 목록이 정확히 이 중 하나인 그룹은 경계 조건이 완전히 같아야 함
    pub strict_condition_tags: Vec<String>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            strict_condition_tags: vec!["VCP".to_owned(), "V".to_owned()],
        }
    }
}

/// 고정 전제 조건 (예: 지정사 '이')
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LiteralEntry {
    pub form: String,
    #[serde(default)]
    pub condition: Option<String>,
    pub tag: String,
}

/// 목록 파일을 기존 목록에 더할지, 대체할지
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ListMode {
    Extend,
    Replace,
}

/// 어근 전제 조건 목록 파일
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LiteralList {
    pub tag: String,
    pub file: String,
    pub mode: ListMode,
}

/// 전제 조건 표 설정
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct PreconditionConfig {
    /// 규칙의 앞 패턴에서 전제 조건을 뽑는 품사
    pub rule_classes: Vec<String>,
    /// 고정 전제 조건을 더할 품사
    pub literal_class: String,
    pub literals: Vec<LiteralEntry>,
    pub literal_lists: Vec<LiteralList>,
}

impl Default for PreconditionConfig {
    fn default() -> Self {
        let literal = |form: &str, condition: Option<&str>, tag: &str| LiteralEntry {
            form: form.to_owned(),
            condition: condition.map(str::to_owned),
            tag: tag.to_owned(),
        };
        let list = |tag: &str, mode| LiteralList {
            tag: tag.to_owned(),
            file: format!("{}.txt", tag),
            mode,
        };
        Self {
            rule_classes: ["V", "A", "VA", "VV", "VX", "NP", "NNB"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            literal_class: "V".to_owned(),
            literals: vec![
                literal("이", None, "VCP"),
                literal("이", Some("-Coda"), "VCP"),
                literal("아니", None, "VCN"),
            ],
            literal_lists: vec![
                list("XSV", ListMode::Replace),
                list("XSA", ListMode::Replace),
                list("VA", ListMode::Extend),
                list("VX", ListMode::Replace),
                list("VV", ListMode::Extend),
            ],
        }
    }
}

/// 결합 엔진 설정
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct EngineConfig {
    /// 소켓 번호를 붙이는 어근 품사
    pub socket_classes: Vec<String>,
    /// 작업 스레드 수 (0 = CPU 수)
    pub threads: usize,
    /// 결과 없는 품사열 캐시 사용
    pub negative_cache: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            socket_classes: vec!["V".to_owned(), "A".to_owned()],
            threads: 0,
            negative_cache: true,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_negative_cache(mut self, enabled: bool) -> Self {
        self.negative_cache = enabled;
        self
    }

    /// 실제 사용할 스레드 수
    pub fn worker_count(&self) -> usize {
        if self.threads > 0 {
            return self.threads;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

/// 설정 파일 로드
pub fn load_config(path: impl AsRef<Path>) -> Result<CombinerConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| CombineError::io(path.display().to_string(), e))?;
    Ok(serde_json::from_str(&content)?)
}

/// 설정 파일 저장
pub fn save_config(config: &CombinerConfig, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CombineError::io(parent.display().to_string(), e))?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json).map_err(|e| CombineError::io(path.display().to_string(), e))?;
    Ok(())
}

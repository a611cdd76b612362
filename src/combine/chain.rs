//! 품사 전이 확률로 어미열 후보 탐색
//!
//! 어근 품사에서 출발해 어미(E*) 품사로만 전이를 따라가며,
//! 누적 확률이 하한 아래로 떨어지는 가지는 잘라냅니다.

use std::collections::BTreeMap;

use crate::config::ChainConfig;
use crate::model::PosModel;

/// 어근부터 이어진 전체 경로와 그 확률
#[derive(Debug, Clone, PartialEq)]
pub struct ChainPath {
    pub tags: Vec<String>,
    pub probability: f64,
}

/// 어근을 뺀 어미열 -> 가중치
///
/// 가중치는 생성 여부 판단용이며 출력 순서에는 쓰지 않습니다.
/// 순회는 품사열 사전순이라 실행마다 같습니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainSet {
    chains: BTreeMap<Vec<String>, f64>,
}

impl ChainSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 가중치 누적
    pub fn add(&mut self, tags: Vec<String>, weight: f64) {
        *self.chains.entry(tags).or_insert(0.0) += weight;
    }

    /// 가중치 덮어쓰기
    pub fn insert(&mut self, tags: Vec<String>, weight: f64) {
        self.chains.insert(tags, weight);
    }

    pub fn weight(&self, tags: &[String]) -> Option<f64> {
        self.chains.get(tags).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[String], f64)> {
        self.chains.iter().map(|(k, v)| (k.as_slice(), *v))
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<Vec<S>> for ChainSet {
    /// 가중치 1로 어미열 목록 구성 (테스트/수동 지정용)
    fn from_iter<I: IntoIterator<Item = Vec<S>>>(iter: I) -> Self {
        let mut set = Self::new();
        for tags in iter {
            set.insert(tags.iter().map(|t| t.as_ref().to_owned()).collect(), 1.0);
        }
        set
    }
}

/// 어미열 탐색기
pub struct ChainEnumerator<'a> {
    model: &'a PosModel,
    config: &'a ChainConfig,
}

impl<'a> ChainEnumerator<'a> {
    pub fn new(model: &'a PosModel, config: &'a ChainConfig) -> Self {
        Self { model, config }
    }

    /// 어근부터의 모든 경로 (각 단계의 중간 경로 포함)
    ///
    /// 경로 길이(어근 포함)는 `max_depth`를 넘지 않고,
    /// 확률은 `epsilon` 이상입니다.
    pub fn expand(&self) -> Vec<ChainPath> {
        let mut seeds: Vec<&String> = Vec::new();
        for seed in &self.config.seeds {
            if !seeds.contains(&seed) {
                seeds.push(seed);
            }
        }
        let mut live: Vec<ChainPath> = seeds
            .into_iter()
            .map(|s| ChainPath {
                tags: vec![s.clone()],
                probability: 1.0,
            })
            .collect();

        let mut paths = Vec::new();
        for _ in 1..self.config.max_depth {
            let mut next = Vec::new();
            for path in &live {
                let Some(last) = path.tags.last() else {
                    continue;
                };
                for (dest, p) in self.model.transitions(last) {
                    if !dest.starts_with(self.config.ending_prefix.as_str()) {
                        continue;
                    }
                    let probability = path.probability * p;
                    if probability < self.config.epsilon {
                        continue;
                    }
                    let mut tags = path.tags.clone();
                    tags.push(dest.clone());
                    next.push(ChainPath { tags, probability });
                }
            }
            if next.is_empty() {
                break;
            }
            paths.extend(next.iter().cloned());
            live = next;
        }
        paths
    }

    /// 어미열 집합 생성
    ///
    /// 어미열 가중치 = Σ(어근 유니그램 × 경로 확률).
    /// 설정된 한 단계 체인(예: NP → 조사)을 덧붙입니다.
    pub fn enumerate(&self) -> ChainSet {
        let paths = self.expand();
        let mut chains = ChainSet::new();
        for path in &paths {
            let root_prior = self.model.unigram(&path.tags[0]);
            chains.add(path.tags[1..].to_vec(), root_prior * path.probability);
        }
        for extra in &self.config.extra_chains {
            for (dest, p) in self.model.transitions(&extra.source) {
                if dest.starts_with(extra.dest_prefix.as_str()) {
                    chains.insert(vec![dest.clone()], *p);
                }
            }
        }
        log::info!("어미열 탐색: 경로 {}개, 어미열 {}개", paths.len(), chains.len());
        chains
    }
}

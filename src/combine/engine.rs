//! 결합 엔진
//!
//! 어근 품사 × 어미열 마다 품사열을 만들고, 자리별 후보의 곱을 하나씩 접어 가며
//! 결합 규칙을 적용합니다.
//!
//! 품사열 단위 작업은 서로 독립이라 여러 스레드로 나눠 처리하고,
//! 결과는 작업 순서대로 모은 뒤 한 스레드에서 소켓 번호를 매깁니다.
//! 따라서 스레드 수와 상관없이 출력이 같습니다.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Mutex};
use std::thread;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::EngineConfig;
use crate::core::phonology::Gate;
use crate::model::{MorphemeKey, MorphemeModel, PreconditionTable, RuleModel};

use super::chain::ChainSet;
use super::output::CombinationResult;

/// 어근과 상관없이 결과가 나올 수 없는 어미열
///
/// 어미열 안에 후보가 없는 자리가 있거나, 이웃한 두 자리의 어떤 품사 쌍에도
/// 규칙 그룹이 없으면 어느 어근 품사 뒤에서도 비어 있습니다.
/// 이런 어미열만 넣으므로 캐시에 걸린 작업은 곱을 만들지 않고 건너뜁니다.
#[derive(Debug, Default)]
pub struct NegativeCache {
    enabled: bool,
    sequences: Mutex<FxHashSet<Vec<String>>>,
}

impl NegativeCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            sequences: Mutex::new(FxHashSet::default()),
        }
    }

    pub fn contains(&self, chain: &[String]) -> bool {
        if !self.enabled {
            return false;
        }
        let sequences = self.sequences.lock().unwrap_or_else(|e| e.into_inner());
        sequences.contains(chain)
    }

    pub fn insert(&self, chain: Vec<String>) {
        if !self.enabled {
            return;
        }
        let mut sequences = self.sequences.lock().unwrap_or_else(|e| e.into_inner());
        sequences.insert(chain);
    }

    pub fn len(&self) -> usize {
        self.sequences.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// (어간 형태, 품사) -> 소켓 번호 (처음 본 순서로 1부터)
#[derive(Debug, Default)]
pub struct SocketTable {
    ids: FxHashMap<MorphemeKey, u32>,
}

impl SocketTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, key: MorphemeKey) -> u32 {
        let next = self.ids.len() as u32 + 1;
        *self.ids.entry(key).or_insert(next)
    }

    pub fn get(&self, form: &str, tag: &str) -> Option<u32> {
        self.ids.get(&MorphemeKey::new(form, tag)).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// 생성 결과
#[derive(Debug, Default)]
pub struct Generation {
    /// 작업 순서대로 정렬된 결합형
    pub results: Vec<CombinationResult>,
    /// 결과가 없던 품사열 (작업 순서)
    pub empty_sequences: Vec<Vec<String>>,
    /// 시도한 품사열 수
    pub attempted: usize,
    /// 캐시 덕분에 곱을 만들지 않은 품사열 수 (여러 스레드면 실행마다 다를 수 있음)
    pub skipped: usize,
    pub sockets: SocketTable,
}

/// 품사열 하나 (어근 품사 + 어미열)
#[derive(Debug, Clone)]
struct WorkUnit {
    root: Option<String>,
    tags: Vec<String>,
}

impl WorkUnit {
    /// 어근 품사를 뺀 어미열
    fn chain(&self) -> &[String] {
        &self.tags[usize::from(self.root.is_some())..]
    }
}

/// 한 자리의 후보
#[derive(Debug, Clone, Copy)]
struct Slot<'s> {
    form: &'s str,
    tag: &'s str,
    condition: Option<&'s str>,
    gate: Option<Gate>,
}

/// 소켓 번호를 매기기 전의 결과
#[derive(Debug)]
struct Pending {
    surface: String,
    provenance: Vec<(String, String)>,
    condition: Option<String>,
    socket_key: Option<MorphemeKey>,
}

/// 품사열 처리 결과
#[derive(Debug, Default)]
struct UnitOutput {
    results: Vec<Pending>,
    empty: bool,
    skipped: bool,
}

/// 결합 엔진
pub struct CombinationEngine<'a> {
    morphemes: &'a MorphemeModel,
    rules: &'a RuleModel,
    preconditions: &'a PreconditionTable,
    config: &'a EngineConfig,
    negative: NegativeCache,
}

impl<'a> CombinationEngine<'a> {
    pub fn new(
        morphemes: &'a MorphemeModel,
        rules: &'a RuleModel,
        preconditions: &'a PreconditionTable,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            morphemes,
            rules,
            preconditions,
            config,
            negative: NegativeCache::new(config.negative_cache),
        }
    }

    /// 전체 생성
    ///
    /// 어근 품사는 "없음"(어미열만)부터 전제 조건 표의 등록 순서대로,
    /// 그 안에서 어미열은 사전순으로 처리합니다.
    pub fn run(self, chains: &ChainSet) -> Generation {
        let units = self.work_units(chains);
        let workers = self.config.worker_count().clamp(1, units.len().max(1));
        log::info!("결합 시작: 품사열 {}개, 스레드 {}개", units.len(), workers);

        let outputs: Vec<UnitOutput> = if workers == 1 {
            units.iter().map(|u| self.process(u)).collect()
        } else {
            self.process_parallel(&units, workers)
        };

        let mut generation = Generation {
            attempted: units.len(),
            ..Default::default()
        };
        for (unit, output) in units.into_iter().zip(outputs) {
            generation.skipped += usize::from(output.skipped);
            if output.empty {
                generation.empty_sequences.push(unit.tags);
                continue;
            }
            for pending in output.results {
                let socket = pending.socket_key.map(|key| generation.sockets.resolve(key));
                generation.results.push(CombinationResult {
                    surface: pending.surface,
                    provenance: pending.provenance,
                    condition: pending.condition,
                    socket,
                });
            }
        }
        log::info!(
            "결합 완료: 결과 {}개, 소켓 {}개, 빈 품사열 {}개 (캐시 {}개, 건너뜀 {}개)",
            generation.results.len(),
            generation.sockets.len(),
            generation.empty_sequences.len(),
            self.negative.len(),
            generation.skipped
        );
        generation
    }

    fn work_units(&self, chains: &ChainSet) -> Vec<WorkUnit> {
        let roots = std::iter::once(None).chain(self.preconditions.classes().map(Some));
        let mut units = Vec::new();
        for root in roots {
            for (chain, _) in chains.iter() {
                let tags: Vec<String> = root
                    .into_iter()
                    .map(str::to_owned)
                    .chain(chain.iter().cloned())
                    .collect();
                if tags.len() < 2 {
                    continue;
                }
                units.push(WorkUnit {
                    root: root.map(str::to_owned),
                    tags,
                });
            }
        }
        units
    }

    fn process_parallel(&self, units: &[WorkUnit], workers: usize) -> Vec<UnitOutput> {
        let next = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel::<(usize, UnitOutput)>();
        thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let next = &next;
                scope.spawn(move || loop {
                    let i = next.fetch_add(1, Ordering::Relaxed);
                    let Some(unit) = units.get(i) else {
                        break;
                    };
                    if tx.send((i, self.process(unit))).is_err() {
                        break;
                    }
                });
            }
        });
        drop(tx);

        let mut outputs: Vec<UnitOutput> = units.iter().map(|_| UnitOutput::default()).collect();
        for (i, output) in rx {
            outputs[i] = output;
        }
        outputs
    }

    fn process(&self, unit: &WorkUnit) -> UnitOutput {
        let chain = unit.chain();
        if self.negative.contains(chain) {
            log::debug!("캐시된 빈 어미열: {:?}", unit.tags);
            return UnitOutput {
                results: Vec::new(),
                empty: true,
                skipped: true,
            };
        }
        let results = self.combine(unit.root.as_deref(), &unit.tags);
        let empty = results.is_empty();
        if !empty {
            log::debug!("{:?}: {}개", unit.tags, results.len());
        } else if self.is_dead_chain(chain) {
            self.negative.insert(chain.to_vec());
        }
        UnitOutput {
            results,
            empty,
            skipped: false,
        }
    }

    /// 어근과 상관없이 결과가 없는 어미열인지
    fn is_dead_chain(&self, chain: &[String]) -> bool {
        let mut positions: Vec<Vec<&str>> = Vec::with_capacity(chain.len());
        for tag in chain {
            let mut tags: Vec<&str> = self.candidates(tag).iter().map(|s| s.tag).collect();
            if tags.is_empty() {
                return true;
            }
            tags.sort_unstable();
            tags.dedup();
            positions.push(tags);
        }
        positions.windows(2).any(|pair| {
            !pair[0]
                .iter()
                .any(|a| pair[1].iter().any(|b| self.rules.has_group(a, b)))
        })
    }

    /// 한 자리의 후보 목록
    ///
    /// 형태소 모델에 그 품사가 있으면 형태소(끝소리 조건 포함),
    /// 없으면 전제 조건 표(경계 조건 포함)에서 가져옵니다.
    fn candidates<'s>(&'s self, tag: &'s str) -> Vec<Slot<'s>> {
        let forms = self.morphemes.forms_by_tag(tag);
        if !forms.is_empty() {
            return forms
                .iter()
                .map(|form| Slot {
                    form,
                    tag,
                    condition: None,
                    gate: self.morphemes.gate(form, tag),
                })
                .collect();
        }
        self.preconditions
            .get(tag)
            .map(|entries| {
                entries
                    .iter()
                    .map(|e| Slot {
                        form: &e.form,
                        tag: &e.tag,
                        condition: e.condition.as_deref(),
                        gate: None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn combine(&self, root: Option<&str>, tags: &[String]) -> Vec<Pending> {
        let lists: Vec<Vec<Slot<'_>>> = tags.iter().map(|t| self.candidates(t)).collect();
        if lists.iter().any(Vec::is_empty) {
            return Vec::new();
        }
        let socketed = root.filter(|r| self.config.socket_classes.iter().any(|c| c == r));

        let mut results = Vec::new();
        let mut index = vec![0usize; lists.len()];
        loop {
            let tuple: Vec<&Slot<'_>> = index.iter().zip(&lists).map(|(&i, list)| &list[i]).collect();
            let surfaces = self.fold(&tuple);
            if !surfaces.is_empty() {
                let head = tuple[0];
                let provenance: Vec<(String, String)> = tuple
                    .iter()
                    .map(|s| (s.form.to_owned(), s.tag.to_owned()))
                    .collect();
                let socket_key = socketed
                    .filter(|r| *r == head.tag)
                    .map(|_| MorphemeKey::new(head.form, head.tag));
                for surface in surfaces {
                    results.push(Pending {
                        surface,
                        provenance: provenance.clone(),
                        condition: head.condition.map(str::to_owned),
                        socket_key: socket_key.clone(),
                    });
                }
            }
            if !advance(&mut index, &lists) {
                break;
            }
        }
        results
    }

    /// 후보 한 벌을 왼쪽부터 접어 표면형 집합을 만듦
    ///
    /// 경계 조건은 첫 결합에만 쓰입니다.
    fn fold(&self, tuple: &[&Slot<'_>]) -> Vec<String> {
        let Some((first, rest)) = tuple.split_first() else {
            return Vec::new();
        };
        let mut forms = vec![first.form.to_owned()];
        let mut tag = first.tag;
        let mut condition = first.condition;
        for slot in rest {
            let mut next: Vec<String> = Vec::new();
            for stem in &forms {
                if slot.gate.is_some_and(|g| !g.holds(stem)) {
                    continue;
                }
                let Some(combined) = self.rules.apply_rules(stem, tag, slot.form, slot.tag, condition) else {
                    continue;
                };
                for surface in combined {
                    if !next.contains(&surface) {
                        next.push(surface);
                    }
                }
            }
            if next.is_empty() {
                return Vec::new();
            }
            forms = next;
            tag = slot.tag;
            condition = None;
        }
        forms
    }
}

/// 오른쪽 자리부터 올리는 다음 조합 (끝이면 `false`)
fn advance<T>(index: &mut [usize], lists: &[Vec<T>]) -> bool {
    for pos in (0..index.len()).rev() {
        index[pos] += 1;
        if index[pos] < lists[pos].len() {
            return true;
        }
        index[pos] = 0;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MorphemeConfig, RuleConfig};
    use crate::model::PreconditionEntry;

    const RULES: &str = "V\tEC\n\
                         ([가나])\t아\t\\1\t+Positive\n\
                         (.)\t아\t\\1아\n\
                         EC\tJX\n\
                         (.)\t(.)\t\\1\\2\n";

    const MORPHEMES: &str = "아\tEC\t100\t0\t0.5\t0.5\t0.5\t0.5\n\
                             요\tJX\t50\t0\t0.5\t0.5\t0.5\t0.5\n";

    fn models() -> (MorphemeModel, RuleModel, PreconditionTable) {
        let config = MorphemeConfig::new().with_excluded_ending_prefixes(vec![]);
        let morphemes = MorphemeModel::parse(MORPHEMES, &config).unwrap();
        let rules = RuleModel::parse(RULES, &RuleConfig::default()).unwrap();
        let mut table = PreconditionTable::new();
        table.replace(
            "V",
            vec![
                PreconditionEntry::new("가", Some("+Positive"), "V"),
                PreconditionEntry::new("먹", None, "V"),
            ],
        );
        (morphemes, rules, table)
    }

    fn chains() -> ChainSet {
        vec![vec!["EC"], vec!["EC", "JX"]].into_iter().collect()
    }

    fn surfaces(generation: &Generation) -> Vec<&str> {
        generation.results.iter().map(|r| r.surface.as_str()).collect()
    }

    #[test]
    fn test_advance_order() {
        let lists = vec![vec![1, 2], vec![1, 2, 3]];
        let mut index = vec![0, 0];
        let mut seen = vec![index.clone()];
        while advance(&mut index, &lists) {
            seen.push(index.clone());
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(seen[1], [0, 1]);
        assert_eq!(seen[3], [1, 0]);
    }

    #[test]
    fn test_run_basic() {
        let (morphemes, rules, table) = models();
        let config = EngineConfig::new().with_threads(1);
        let generation = CombinationEngine::new(&morphemes, &rules, &table, &config).run(&chains());
        // 어미열만: (EC) 는 길이 1이라 건너뜀, (EC, JX) 는 아+요
        // V 뿌리: 가+아 (+Positive 규칙), 먹+아, 가+아+요, 먹+아+요
        assert_eq!(surfaces(&generation), ["아요", "가", "먹아", "가요", "먹아요"]);
        assert_eq!(generation.attempted, 3);
        assert!(generation.empty_sequences.is_empty());
    }

    #[test]
    fn test_condition_and_socket() {
        let (morphemes, rules, table) = models();
        let config = EngineConfig::new().with_threads(1);
        let generation = CombinationEngine::new(&morphemes, &rules, &table, &config).run(&chains());

        let ayo = &generation.results[0];
        assert_eq!(ayo.condition, None);
        assert_eq!(ayo.socket, None);

        let ga = &generation.results[1];
        assert_eq!(ga.condition.as_deref(), Some("+Positive"));
        assert_eq!(ga.provenance, [("가".to_owned(), "V".to_owned()), ("아".to_owned(), "EC".to_owned())]);
        // 같은 어간은 같은 소켓
        assert_eq!(ga.socket, Some(1));
        assert_eq!(generation.results[2].socket, Some(2));
        assert_eq!(generation.results[3].socket, Some(1));
        assert_eq!(generation.results[4].socket, Some(2));
        assert_eq!(generation.sockets.get("먹", "V"), Some(2));
    }

    #[test]
    fn test_no_socket_outside_classes() {
        let (morphemes, rules, table) = models();
        let config = EngineConfig {
            socket_classes: vec!["A".to_owned()],
            threads: 1,
            negative_cache: true,
        };
        let generation = CombinationEngine::new(&morphemes, &rules, &table, &config).run(&chains());
        assert!(generation.results.iter().all(|r| r.socket.is_none()));
        assert!(generation.sockets.is_empty());
    }

    #[test]
    fn test_empty_sequence_recorded() {
        let (morphemes, rules, table) = models();
        let config = EngineConfig::new().with_threads(1);
        // JX 뒤에 올 규칙이 없음
        let chains: ChainSet = vec![vec!["EC", "JX", "JX"]].into_iter().collect();
        let engine = CombinationEngine::new(&morphemes, &rules, &table, &config);
        let generation = engine.run(&chains);
        assert!(generation.results.is_empty());
        assert_eq!(generation.empty_sequences.len(), 2);
        assert_eq!(generation.empty_sequences[1], ["V", "EC", "JX", "JX"]);
    }

    #[test]
    fn test_dead_chain_skipped_for_other_roots() {
        let (morphemes, rules, mut table) = models();
        table.replace("A", vec![PreconditionEntry::new("나", None, "A")]);
        let chains: ChainSet = vec![vec!["EC", "JX", "JX"], vec!["EC", "JX"]].into_iter().collect();

        let cached = EngineConfig::new().with_threads(1);
        let a = CombinationEngine::new(&morphemes, &rules, &table, &cached).run(&chains);
        let uncached = EngineConfig::new().with_threads(1).with_negative_cache(false);
        let b = CombinationEngine::new(&morphemes, &rules, &table, &uncached).run(&chains);

        // 어근 없음에서 (EC, JX, JX) 가 비면 V, A 뒤에서는 곱을 만들지 않음
        assert_eq!(a.skipped, 2);
        assert_eq!(b.skipped, 0);
        assert_eq!(a.attempted, b.attempted);
        assert_eq!(a.results, b.results);
        assert_eq!(a.empty_sequences, b.empty_sequences);
        assert_eq!(a.empty_sequences.len(), 4);
    }

    #[test]
    fn test_root_dependent_miss_not_cached() {
        let (morphemes, _, table) = models();
        // A 뒤에만 EC 규칙이 있음
        let rules = RuleModel::parse("A\tEC\n(.)\t아\t\\1아\n", &RuleConfig::default()).unwrap();
        let mut table = table;
        table.replace("A", vec![PreconditionEntry::new("나", None, "A")]);
        let chains: ChainSet = vec![vec!["EC"]].into_iter().collect();
        let config = EngineConfig::new().with_threads(1);
        let generation = CombinationEngine::new(&morphemes, &rules, &table, &config).run(&chains);
        // V 뒤에서 비어도 A 는 그대로 시도
        assert_eq!(surfaces(&generation), ["나아"]);
        assert_eq!(generation.skipped, 0);
        assert_eq!(generation.empty_sequences, [vec!["V".to_owned(), "EC".to_owned()]]);
    }

    #[test]
    fn test_negative_cache() {
        let cache = NegativeCache::new(true);
        let tags = vec!["V".to_owned(), "EC".to_owned()];
        assert!(!cache.contains(&tags));
        cache.insert(tags.clone());
        assert!(cache.contains(&tags));
        assert_eq!(cache.len(), 1);

        let disabled = NegativeCache::new(false);
        disabled.insert(tags.clone());
        assert!(!disabled.contains(&tags));
        assert!(disabled.is_empty());
    }

    #[test]
    fn test_gate_blocks_stem() {
        let morphemes = MorphemeModel::parse(
            "는\tETM\t100\t0\t0.97\t0.97\t0.97\t0.5\n",
            &MorphemeConfig::new().with_excluded_ending_prefixes(vec![]),
        )
        .unwrap();
        let rules = RuleModel::parse("V\tETM\n(.)\t(.)\t\\1\\2\n", &RuleConfig::default()).unwrap();
        let mut table = PreconditionTable::new();
        table.replace(
            "V",
            vec![
                PreconditionEntry::new("가", None, "V"),
                PreconditionEntry::new("머\u{11A8}", None, "V"),
            ],
        );
        let config = EngineConfig::new().with_threads(1);
        let chains: ChainSet = vec![vec!["ETM"]].into_iter().collect();
        let generation = CombinationEngine::new(&morphemes, &rules, &table, &config).run(&chains);
        assert_eq!(surfaces(&generation), ["가는"]);
    }

    #[test]
    fn test_thread_count_does_not_change_output() {
        let (morphemes, rules, table) = models();
        let single = EngineConfig::new().with_threads(1);
        let multi = EngineConfig::new().with_threads(4);
        let a = CombinationEngine::new(&morphemes, &rules, &table, &single).run(&chains());
        let b = CombinationEngine::new(&morphemes, &rules, &table, &multi).run(&chains());
        assert_eq!(a.results, b.results);
        assert_eq!(a.empty_sequences, b.empty_sequences);
    }
}

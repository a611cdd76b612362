//! 어근 자리 전제 조건 표
//!
//! 어근 품사(V, A, VV, XSV ...)마다 첫 자리에 올 수 있는 형태와 경계 조건을 모읍니다.
//! 출처는 결합 규칙의 앞 패턴, 고정 목록(지정사), 불규칙 용언 목록 파일입니다.

use std::fs;
use std::path::Path;

use crate::config::{LiteralEntry, ListMode, PreconditionConfig};
use crate::core::unicode::split_coda;
use crate::error::{CombineError, Result};

use super::rule::RuleModel;

/// 첫 자리 후보 하나
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PreconditionEntry {
    /// 형태 (또는 기본형)
    pub form: String,
    /// 경계 조건 (없으면 단순 형태)
    pub condition: Option<String>,
    pub tag: String,
}

impl PreconditionEntry {
    pub fn new(form: impl Into<String>, condition: Option<&str>, tag: impl Into<String>) -> Self {
        Self {
            form: form.into(),
            condition: condition.map(str::to_owned),
            tag: tag.into(),
        }
    }
}

impl From<&LiteralEntry> for PreconditionEntry {
    fn from(e: &LiteralEntry) -> Self {
        Self::new(e.form.clone(), e.condition.as_deref(), e.tag.clone())
    }
}

/// 품사별 전제 조건 목록 (등록 순서 유지)
#[derive(Debug, Clone, Default)]
pub struct PreconditionTable {
    classes: Vec<(String, Vec<PreconditionEntry>)>,
}

impl PreconditionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 설정대로 전체 표 구성
    ///
    /// 목록 파일은 `lists_dir` 기준이며, 하나라도 없으면 실패합니다.
    pub fn build(rules: &RuleModel, config: &PreconditionConfig, lists_dir: impl AsRef<Path>) -> Result<Self> {
        let mut table = Self::from_rules(rules, &config.rule_classes);
        if !config.literals.is_empty() {
            table.extend(
                &config.literal_class,
                config.literals.iter().map(PreconditionEntry::from).collect(),
            );
        }
        for list in &config.literal_lists {
            let entries = load_literals(lists_dir.as_ref().join(&list.file), &list.tag)?;
            log::info!("전제 조건 목록 {}: {}개 ({:?})", list.file, entries.len(), list.mode);
            match list.mode {
                ListMode::Extend => table.extend(&list.tag, entries),
                ListMode::Replace => table.replace(&list.tag, entries),
            }
        }
        Ok(table)
    }

    /// 규칙에서 뽑은 전제 조건으로 표 생성
    pub fn from_rules(rules: &RuleModel, classes: &[String]) -> Self {
        let mut table = Self::new();
        for class in classes {
            let entries = rules
                .preconditions(class)
                .into_iter()
                .map(|(form, cond)| PreconditionEntry::new(form, cond.as_deref(), class.clone()))
                .collect();
            table.replace(class, entries);
        }
        table
    }

    /// 기존 목록 뒤에 추가 (없으면 새 품사)
    pub fn extend(&mut self, class: &str, entries: Vec<PreconditionEntry>) {
        match self.classes.iter_mut().find(|(c, _)| c == class) {
            Some((_, list)) => list.extend(entries),
            None => self.classes.push((class.to_owned(), entries)),
        }
    }

    /// 기존 목록 대체 (순서 위치는 유지)
    pub fn replace(&mut self, class: &str, entries: Vec<PreconditionEntry>) {
        match self.classes.iter_mut().find(|(c, _)| c == class) {
            Some((_, list)) => *list = entries,
            None => self.classes.push((class.to_owned(), entries)),
        }
    }

    pub fn get(&self, class: &str) -> Option<&[PreconditionEntry]> {
        self.classes
            .iter()
            .find(|(c, _)| c == class)
            .map(|(_, list)| list.as_slice())
    }

    /// 등록 순서대로 품사 이름
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|(c, _)| c.as_str())
    }
}

/// 목록 텍스트 파싱: 줄마다 형태(종성 분리형으로 정규화), 선택적으로 조건
pub fn parse_literals(text: &str, tag: &str) -> Vec<PreconditionEntry> {
    text.lines()
        .filter_map(|line| {
            let mut fields = line.trim().split('\t');
            let form = fields.next().filter(|f| !f.is_empty())?;
            let condition = fields.next().map(str::trim).filter(|c| !c.is_empty());
            Some(PreconditionEntry::new(split_coda(form), condition, tag))
        })
        .collect()
}

/// 목록 파일 로드 (파일이 없으면 치명적 에러)
pub fn load_literals(path: impl AsRef<Path>, tag: &str) -> Result<Vec<PreconditionEntry>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CombineError::MissingList(path.display().to_string()));
    }
    let text = fs::read_to_string(path).map_err(|e| CombineError::io(path.display().to_string(), e))?;
    Ok(parse_literals(&text, tag))
}

//! 품사 쌍별 결합 규칙 모델
//!
//! # 파일 형식
//! ```text
//! # 주석
//! VV,VA	EC,EF            ← 그룹 헤더: 앞 품사 접두어 목록, 뒤 품사 접두어 목록
//! 하	아	해              ← 규칙: 앞 패턴, 뒤 패턴, 결과 템플릿(쉼표 구분), [경계 조건]
//! ㅏ	아	ㅏ	+Positive
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::config::RuleConfig;
use crate::core::phonology::is_single_vowel;
use crate::core::unicode::{compose_open_syllable, CHOSEONG_COUNT};
use crate::error::{CombineError, Result};

use super::pattern::{PatternError, RulePattern, Template};

/// 결합 규칙 하나
#[derive(Debug, Clone)]
pub struct Rule {
    left: String,
    pattern: RulePattern,
    templates: Vec<Template>,
    condition: Option<String>,
}

impl Rule {
    /// 패턴과 템플릿을 컴파일하여 규칙 생성
    pub fn new(left: &str, right: &str, templates: &[&str], condition: Option<&str>) -> Result<Self, PatternError> {
        let pattern = RulePattern::compile(left, right)?;
        let templates = templates
            .iter()
            .map(|t| {
                let template = Template::parse(t)?;
                template.check_groups(pattern.group_count())?;
                Ok(template)
            })
            .collect::<Result<Vec<_>, PatternError>>()?;
        Ok(Self {
            left: left.to_owned(),
            pattern,
            templates,
            condition: condition.map(str::to_owned),
        })
    }

    pub fn left(&self) -> &str {
        &self.left
    }

    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }

    /// 두 형태에 적용 (템플릿마다 결과 하나)
    pub fn apply(&self, form_a: &str, form_b: &str) -> Option<Vec<String>> {
        let caps = self.pattern.captures(form_a, form_b)?;
        self.templates.iter().map(|t| t.expand(&caps)).collect()
    }

    /// 앞 패턴에서 전제 조건 문자열 추출
    ///
    /// 앵커를 떼고, 패턴 전체가 문자 집합이면 구성 문자마다 하나씩 돌려줍니다.
    fn precondition_literals(&self) -> Vec<String> {
        let stripped: String = self.left.chars().filter(|&c| c != '^' && c != '$').collect();
        let inner = stripped
            .strip_prefix("([")
            .and_then(|s| s.strip_suffix("])"))
            .or_else(|| stripped.strip_prefix('[').and_then(|s| s.strip_suffix(']')));
        match inner {
            Some(members) => expand_class_members(members),
            None => vec![stripped],
        }
    }
}

fn expand_class_members(members: &str) -> Vec<String> {
    let chars: Vec<char> = members.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if i + 2 < chars.len() && chars[i + 1] == '-' {
            let (lo, hi) = (chars[i].min(chars[i + 2]), chars[i].max(chars[i + 2]));
            out.extend((lo..=hi).map(String::from));
            i += 3;
        } else {
            out.push(chars[i].to_string());
            i += 1;
        }
    }
    out
}

/// 앞/뒤 품사 접두어 목록으로 묶인 규칙 그룹
#[derive(Debug, Clone)]
pub struct PosPairGroup {
    left_tags: Vec<String>,
    right_tags: Vec<String>,
    rules: Vec<Rule>,
    /// 경계 조건이 비어 있어도 규칙 조건과 정확히 같아야 하는 그룹
    strict_condition: bool,
}

impl PosPairGroup {
    pub fn new(left_tags: Vec<String>, right_tags: Vec<String>, strict_condition: bool) -> Self {
        Self {
            left_tags,
            right_tags,
            rules: Vec::new(),
            strict_condition,
        }
    }

    /// 규칙 추가
    ///
    /// 앞 패턴과 첫 결과가 모두 모음 자모 하나면 19개 초성에 대해 음절 규칙으로 전개합니다.
    pub fn append_rule(&mut self, left: &str, right: &str, templates: &[&str], condition: Option<&str>) -> Result<()> {
        let first = templates.first().copied().unwrap_or_default();
        if !(is_single_vowel(left) && is_single_vowel(first)) {
            self.rules.push(Rule::new(left, right, templates, condition)?);
            return Ok(());
        }

        let (Some(vowel_left), Some(vowel_result)) = (left.chars().next(), first.chars().next()) else {
            return Ok(());
        };
        for cho in 0..CHOSEONG_COUNT {
            let l = compose_open_syllable(cho, vowel_left)?.to_string();
            let r = compose_open_syllable(cho, vowel_result)?.to_string();
            self.rules.push(Rule::new(&l, right, &[&r], condition)?);
        }
        Ok(())
    }

    /// 앞/뒤 품사가 그룹의 접두어 목록에 걸리는지
    pub fn matches(&self, tag_a: &str, tag_b: &str) -> bool {
        self.left_tags.iter().any(|p| tag_a.starts_with(p.as_str()))
            && self.right_tags.iter().any(|p| tag_b.starts_with(p.as_str()))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn left_tags(&self) -> &[String] {
        &self.left_tags
    }

    pub fn is_strict(&self) -> bool {
        self.strict_condition
    }

    /// 선언 순서대로 첫 번째로 맞는 규칙의 결과
    pub fn apply(&self, form_a: &str, form_b: &str, condition: Option<&str>) -> Option<Vec<String>> {
        self.rules
            .iter()
            .filter(|rule| {
                let differs = condition != rule.condition();
                !((condition.is_some() && differs) || (self.strict_condition && differs))
            })
            .find_map(|rule| rule.apply(form_a, form_b))
    }
}

/// 결합 규칙 모델
#[derive(Debug, Clone, Default)]
pub struct RuleModel {
    groups: Vec<PosPairGroup>,
}

impl RuleModel {
    /// 규칙 파일 로드
    pub fn load(path: impl AsRef<Path>, config: &RuleConfig) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| CombineError::io(path.display().to_string(), e))?;
        let model = Self::parse(&text, config)?;
        log::info!(
            "규칙 모델 로드: {} ({}개 그룹, {}개 규칙)",
            path.display(),
            model.groups.len(),
            model.rule_count()
        );
        Ok(model)
    }

    /// 규칙 텍스트 파싱
    pub fn parse(text: &str, config: &RuleConfig) -> Result<Self> {
        let mut groups: Vec<PosPairGroup> = Vec::new();
        for (no, line) in text.lines().enumerate() {
            if line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.trim().split('\t').collect();
            match fields.len() {
                0 | 1 => continue,
                2 => {
                    let left: Vec<String> = fields[0].split(',').map(str::to_owned).collect();
                    let right: Vec<String> = fields[1].split(',').map(str::to_owned).collect();
                    let strict = left.len() == 1 && config.strict_condition_tags.contains(&left[0]);
                    groups.push(PosPairGroup::new(left, right, strict));
                }
                _ => {
                    let Some(group) = groups.last_mut() else {
                        log::warn!("{}번째 줄: 그룹 헤더 앞의 규칙 무시", no + 1);
                        continue;
                    };
                    let templates: Vec<&str> = fields[2].split(',').collect();
                    let condition = fields.get(3).copied().filter(|c| !c.is_empty());
                    match group.append_rule(fields[0], fields[1], &templates, condition) {
                        Ok(()) => {}
                        Err(CombineError::Pattern(e)) => {
                            log::warn!("{}번째 줄: 규칙 무시 ({})", no + 1, e);
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }
        Ok(Self { groups })
    }

    pub fn groups(&self) -> &[PosPairGroup] {
        &self.groups
    }

    pub fn rule_count(&self) -> usize {
        self.groups.iter().map(|g| g.rules.len()).sum()
    }

    /// 품사 쌍에 맞는 그룹이 하나라도 있는지
    pub fn has_group(&self, tag_a: &str, tag_b: &str) -> bool {
        self.groups.iter().any(|g| g.matches(tag_a, tag_b))
    }

    /// 품사 쌍에 맞는 그룹을 선언 순서대로 시도하여 첫 결과를 돌려줌
    pub fn apply_rules(
        &self,
        form_a: &str,
        tag_a: &str,
        form_b: &str,
        tag_b: &str,
        condition: Option<&str>,
    ) -> Option<Vec<String>> {
        self.groups
            .iter()
            .filter(|g| g.matches(tag_a, tag_b))
            .filter_map(|g| g.apply(form_a, form_b, condition))
            .find(|res| !res.is_empty())
    }

    /// 품사가 앞쪽 목록에 정확히 들어 있는 그룹들의 규칙에서 전제 조건 추출
    ///
    /// (문자열, 조건) 쌍으로 중복 제거 후 정렬하여 돌려줍니다.
    pub fn preconditions(&self, tag: &str) -> Vec<(String, Option<String>)> {
        let mut set: BTreeSet<(String, String, Option<String>)> = BTreeSet::new();
        for group in self.groups.iter().filter(|g| g.left_tags.iter().any(|t| t == tag)) {
            for rule in &group.rules {
                for literal in rule.precondition_literals() {
                    let cond = rule.condition.clone();
                    let sort_key = cond.clone().unwrap_or_default();
                    set.insert((literal, sort_key, cond));
                }
            }
        }
        set.into_iter().map(|(literal, _, cond)| (literal, cond)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(text: &str) -> RuleModel {
        RuleModel::parse(text, &RuleConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_groups_and_comments() {
        let rules = model("# 주석\nVV,VA\tEC\n하\t아\t해\n\nXSV\tEF\n(.)\t다\t\\1다\t-Coda\n");
        assert_eq!(rules.groups().len(), 2);
        assert_eq!(rules.rule_count(), 2);
        assert_eq!(rules.groups()[0].left_tags(), ["VV", "VA"]);
        assert_eq!(rules.groups()[1].rules()[0].condition(), Some("-Coda"));
    }

    #[test]
    fn test_has_group() {
        let rules = model("VV,VA\tEC\n하\t아\t해\nEC\tJ\n(.)\t(.)\t\\1\\2\n");
        assert!(rules.has_group("VV", "EC"));
        assert!(rules.has_group("EC", "JX"));
        assert!(!rules.has_group("JX", "JX"));
        assert!(!rules.has_group("EC", "EC"));
    }

    #[test]
    fn test_rule_precedence() {
        let rules = model("VV\tEC\n하\t아\t해\n하\t아\t하여\n");
        assert_eq!(rules.apply_rules("하", "VV", "아", "EC", None), Some(vec!["해".to_owned()]));
    }

    #[test]
    fn test_multiple_templates() {
        let rules = model("VV\tEC\n하\t아\t해,하여\n");
        assert_eq!(
            rules.apply_rules("하", "VV", "아서", "EC", None),
            Some(vec!["해서".to_owned(), "하여서".to_owned()])
        );
    }

    #[test]
    fn test_prefix_matching() {
        let rules = model("V\tE\n(.)\t(.)\t\\1\\2\n");
        assert_eq!(rules.apply_rules("가", "VV", "고", "EC", None), Some(vec!["가고".to_owned()]));
        assert_eq!(rules.apply_rules("가", "NNG", "고", "EC", None), None);
    }

    #[test]
    fn test_group_fallthrough() {
        let rules = model("VV\tEC\n하\t아\t해\nV\tEC\n(.)\t(.)\t\\1\\2\n");
        // 첫 그룹에 맞는 규칙이 없으면 다음 그룹
        assert_eq!(rules.apply_rules("가", "VV", "고", "EC", None), Some(vec!["가고".to_owned()]));
    }

    #[test]
    fn test_condition_filter() {
        let rules = model("VV\tEC\n(.)\t아\t\\1아\t+Positive\n(.)\t아\t\\1어\n");
        assert_eq!(rules.apply_rules("가", "VV", "아", "EC", Some("+Positive")), Some(vec!["가아".to_owned()]));
        // 조건이 없으면 조건 있는 규칙도 시도됨
        assert_eq!(rules.apply_rules("가", "VV", "아", "EC", None), Some(vec!["가아".to_owned()]));
        // 다른 조건이면 해당 규칙 건너뜀
        assert_eq!(rules.apply_rules("가", "VV", "아", "EC", Some("-Positive")), None);
    }

    #[test]
    fn test_strict_group() {
        let rules = model("VCP\tEC\n(.)\t(.)\t\\1\\2\t-Coda\n(.)\t(.)\t\\1_\\2\n");
        assert!(rules.groups()[0].is_strict());
        // 엄격 그룹: 조건이 없으면 조건 없는 규칙만
        assert_eq!(rules.apply_rules("이", "VCP", "고", "EC", None), Some(vec!["이_고".to_owned()]));
        assert_eq!(rules.apply_rules("이", "VCP", "고", "EC", Some("-Coda")), Some(vec!["이고".to_owned()]));
    }

    #[test]
    fn test_vowel_harmony_expansion() {
        let rules = model("VV\tEC\nㅏ\t아\tㅏ\n");
        assert_eq!(rules.rule_count(), 19);
        assert_eq!(rules.groups()[0].rules()[0].left(), "가");
        assert_eq!(rules.groups()[0].rules()[18].left(), "하");
        assert_eq!(rules.apply_rules("가", "VV", "아서", "EC", None), Some(vec!["가서".to_owned()]));
        assert_eq!(rules.apply_rules("자", "VV", "아", "EC", None), Some(vec!["자".to_owned()]));
    }

    #[test]
    fn test_invalid_rule_skipped() {
        let rules = model("VV\tEC\n가*\t아\t해\n(가)\t아\t\\2\n하\t아\t해\n");
        assert_eq!(rules.rule_count(), 1);
    }

    #[test]
    fn test_rule_before_header_skipped() {
        let rules = model("하\t아\t해\nVV\tEC\n");
        assert_eq!(rules.rule_count(), 0);
    }

    #[test]
    fn test_preconditions() {
        let rules = model(
            "V\tEC\n^하\t아\t해\n([가나])\t아\t\\1\t+Positive\n하\t어\t해\nV,VV\tEF\n([가-각])\t다\t\\1다\nVV\tEF\n파\t다\t파\n",
        );
        assert_eq!(
            rules.preconditions("V"),
            vec![
                ("가".to_owned(), None),
                ("가".to_owned(), Some("+Positive".to_owned())),
                ("각".to_owned(), None),
                ("나".to_owned(), Some("+Positive".to_owned())),
                ("하".to_owned(), None),
            ]
        );
        // 접두어가 아니라 정확히 일치하는 그룹만
        assert_eq!(rules.preconditions("VV").len(), 3);
        assert!(rules.preconditions("VA").is_empty());
    }
}

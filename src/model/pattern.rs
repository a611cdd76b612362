//! 결합 규칙의 패턴/템플릿 매처
//!
//! 정규식 엔진 없이 두 필드(앞 형태, 뒤 형태)에 대한 고정 길이 패턴만 다룹니다.
//!
//! 패턴 원소 (모두 정확히 한 글자와 대응):
//! - 일반 문자, `\x` (이스케이프된 문자)
//! - `.` 임의의 한 글자
//! - `[...]` 문자 집합 (`a-b` 범위, 맨 앞 `^`는 부정)
//! - `( ... )` 캡처 그룹 (중첩 불가)
//!
//! 앞 패턴은 앞 형태의 끝부분, 뒤 패턴은 뒤 형태의 시작부분에 맞춥니다.
//! 앞 패턴 맨 앞의 `^`는 앞 형태 전체, 뒤 패턴 맨 끝의 `$`는 뒤 형태 전체를 요구합니다.
//!
//! 템플릿은 일반 문자와 `\1`~`\9` 그룹 참조로 이루어지며,
//! 그룹 번호는 앞 패턴의 그룹부터 차례로 매깁니다.

use thiserror::Error;

/// 패턴/템플릿 컴파일 에러
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("닫히지 않은 문자 집합: {0}")]
    UnclosedClass(String),
    #[error("괄호 짝이 맞지 않음: {0}")]
    UnbalancedGroup(String),
    #[error("중첩된 그룹은 지원하지 않음: {0}")]
    NestedGroup(String),
    #[error("끝나지 않은 이스케이프: {0}")]
    DanglingEscape(String),
    #[error("지원하지 않는 패턴 문자 {ch:?}: {pattern}")]
    Unsupported { pattern: String, ch: char },
    #[error("템플릿 {template}이 없는 그룹 \\{group}을 참조함")]
    UnknownGroup { template: String, group: usize },
}

/// 한 글자 원소
#[derive(Debug, Clone, PartialEq, Eq)]
enum Atom {
    Char(char),
    Any,
    Class { ranges: Vec<(char, char)>, negated: bool },
}

impl Atom {
    fn matches(&self, c: char) -> bool {
        match self {
            Atom::Char(x) => *x == c,
            Atom::Any => true,
            Atom::Class { ranges, negated } => {
                ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi) != *negated
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Element {
    atom: Atom,
    group: Option<usize>,
}

/// 한쪽 필드의 패턴
#[derive(Debug, Clone, PartialEq, Eq)]
struct Side {
    elements: Vec<Element>,
    anchored: bool,
}

/// 앞/뒤 두 필드로 된 규칙 패턴
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulePattern {
    left: Side,
    right: Side,
    groups: usize,
}

/// 패턴 매칭 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captures {
    /// 앞 형태 중 패턴에 걸리지 않은 앞부분
    prefix: String,
    /// 뒤 형태 중 패턴에 걸리지 않은 뒷부분
    suffix: String,
    groups: Vec<String>,
}

impl Captures {
    pub fn group(&self, index: usize) -> Option<&str> {
        self.groups.get(index).map(String::as_str)
    }
}

fn is_unsupported(c: char) -> bool {
    matches!(c, '*' | '+' | '?' | '{' | '}' | '|')
}

fn parse_class(chars: &[char], start: usize, src: &str) -> Result<(Atom, usize), PatternError> {
    // start는 '[' 다음 위치
    let mut i = start;
    let mut negated = false;
    if chars.get(i) == Some(&'^') {
        negated = true;
        i += 1;
    }
    let mut members: Vec<char> = Vec::new();
    let mut ranges = Vec::new();
    loop {
        let Some(&c) = chars.get(i) else {
            return Err(PatternError::UnclosedClass(src.to_owned()));
        };
        match c {
            ']' => break,
            '\\' => {
                let escaped = *chars
                    .get(i + 1)
                    .ok_or_else(|| PatternError::DanglingEscape(src.to_owned()))?;
                members.push(escaped);
                i += 2;
            }
            '-' if !members.is_empty() && chars.get(i + 1).is_some_and(|&n| n != ']') => {
                let lo = members.pop().unwrap_or(c);
                let hi = chars[i + 1];
                ranges.push((lo.min(hi), lo.max(hi)));
                i += 2;
            }
            _ => {
                members.push(c);
                i += 1;
            }
        }
    }
    ranges.extend(members.into_iter().map(|c| (c, c)));
    Ok((Atom::Class { ranges, negated }, i + 1))
}

fn parse_side(src: &str, is_left: bool, first_group: usize) -> Result<(Side, usize), PatternError> {
    let mut chars: Vec<char> = src.chars().collect();
    let mut anchored = false;
    if is_left && chars.first() == Some(&'^') {
        anchored = true;
        chars.remove(0);
    }
    if !is_left && chars.last() == Some(&'$') && !src.ends_with("\\$") {
        anchored = true;
        chars.pop();
    }

    let mut elements = Vec::new();
    let mut next_group = first_group;
    let mut open: Option<usize> = None;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                let escaped = *chars
                    .get(i + 1)
                    .ok_or_else(|| PatternError::DanglingEscape(src.to_owned()))?;
                elements.push(Element { atom: Atom::Char(escaped), group: open });
                i += 2;
                continue;
            }
            '.' => elements.push(Element { atom: Atom::Any, group: open }),
            '[' => {
                let (atom, next) = parse_class(&chars, i + 1, src)?;
                elements.push(Element { atom, group: open });
                i = next;
                continue;
            }
            '(' => {
                if open.is_some() {
                    return Err(PatternError::NestedGroup(src.to_owned()));
                }
                open = Some(next_group);
                next_group += 1;
            }
            ')' => {
                if open.take().is_none() {
                    return Err(PatternError::UnbalancedGroup(src.to_owned()));
                }
            }
            c if is_unsupported(c) => {
                return Err(PatternError::Unsupported { pattern: src.to_owned(), ch: c });
            }
            _ => elements.push(Element { atom: Atom::Char(c), group: open }),
        }
        i += 1;
    }
    if open.is_some() {
        return Err(PatternError::UnbalancedGroup(src.to_owned()));
    }
    Ok((Side { elements, anchored }, next_group - first_group))
}

impl RulePattern {
    /// 앞/뒤 패턴 컴파일
    pub fn compile(left: &str, right: &str) -> Result<Self, PatternError> {
        let (left, left_groups) = parse_side(left, true, 0)?;
        let (right, right_groups) = parse_side(right, false, left_groups)?;
        Ok(Self {
            left,
            right,
            groups: left_groups + right_groups,
        })
    }

    /// 캡처 그룹 수
    pub fn group_count(&self) -> usize {
        self.groups
    }

    /// 두 형태에 패턴 적용
    ///
    /// 앞 패턴이 `form_a`의 끝에, 뒤 패턴이 `form_b`의 시작에 모두 맞아야 합니다.
    pub fn captures(&self, form_a: &str, form_b: &str) -> Option<Captures> {
        let a: Vec<char> = form_a.chars().collect();
        let b: Vec<char> = form_b.chars().collect();
        let n_left = self.left.elements.len();
        let n_right = self.right.elements.len();
        if a.len() < n_left || b.len() < n_right {
            return None;
        }
        if (self.left.anchored && a.len() != n_left) || (self.right.anchored && b.len() != n_right) {
            return None;
        }

        let mut groups = vec![String::new(); self.groups];
        let left_tail = &a[a.len() - n_left..];
        let right_head = &b[..n_right];
        let pairs = self
            .left
            .elements
            .iter()
            .zip(left_tail)
            .chain(self.right.elements.iter().zip(right_head));
        for (element, &c) in pairs {
            if !element.atom.matches(c) {
                return None;
            }
            if let Some(g) = element.group {
                groups[g].push(c);
            }
        }

        Some(Captures {
            prefix: a[..a.len() - n_left].iter().collect(),
            suffix: b[n_right..].iter().collect(),
            groups,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Text(String),
    Group(usize),
}

/// 결과 템플릿
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    parts: Vec<Part>,
}

impl Template {
    pub fn parse(src: &str) -> Result<Self, PatternError> {
        let mut parts = Vec::new();
        let mut text = String::new();
        let mut chars = src.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                text.push(c);
                continue;
            }
            let next = chars
                .next()
                .ok_or_else(|| PatternError::DanglingEscape(src.to_owned()))?;
            match next.to_digit(10) {
                Some(d) if d > 0 => {
                    if !text.is_empty() {
                        parts.push(Part::Text(std::mem::take(&mut text)));
                    }
                    parts.push(Part::Group(d as usize - 1));
                }
                _ => text.push(next),
            }
        }
        if !text.is_empty() {
            parts.push(Part::Text(text));
        }
        Ok(Self {
            source: src.to_owned(),
            parts,
        })
    }

    /// 패턴의 그룹 수로 참조 검증
    pub fn check_groups(&self, groups: usize) -> Result<(), PatternError> {
        for part in &self.parts {
            if let Part::Group(g) = part {
                if *g >= groups {
                    return Err(PatternError::UnknownGroup {
                        template: self.source.clone(),
                        group: g + 1,
                    });
                }
            }
        }
        Ok(())
    }

    /// 매칭 결과에 템플릿 적용: 앞부분 + 치환 + 뒷부분
    ///
    /// 참조한 그룹이 없으면 `None`
    pub fn expand(&self, caps: &Captures) -> Option<String> {
        let mut out = caps.prefix.clone();
        for part in &self.parts {
            match part {
                Part::Text(t) => out.push_str(t),
                Part::Group(g) => out.push_str(caps.group(*g)?),
            }
        }
        out.push_str(&caps.suffix);
        Some(out)
    }
}

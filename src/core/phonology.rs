//! 어간 끝소리 음운 판정
//!
//! 모든 판정은 종성 분리형 문자열을 기준으로 합니다.

use super::unicode::{decompose_syllable, jungseong_index};

/// ㄹ 종성 (조합형)
const CODA_RIEUL: char = '\u{11AF}';
/// ㅎ 종성 (조합형)
const CODA_HIEUH: char = '\u{11C2}';

/// 마지막 글자가 받침 없는 음절인지 (모음으로 끝남)
pub fn is_vowel_final(s: &str) -> bool {
    s.chars()
        .next_back()
        .and_then(decompose_syllable)
        .is_some_and(|(_, _, jong)| jong == 0)
}

/// 모음 또는 ㄹ로 끝나는지
pub fn is_vocalic_final(s: &str) -> bool {
    is_vowel_final(s) || s.ends_with(CODA_RIEUL)
}

/// 모음, ㄹ 또는 ㅎ으로 끝나는지
pub fn is_vocalic_h_final(s: &str) -> bool {
    is_vocalic_final(s) || s.ends_with(CODA_HIEUH)
}

/// 한 글자짜리 모음 자모(ㅏ~ㅣ)인지
pub fn is_single_vowel(s: &str) -> bool {
    let mut chars = s.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if jungseong_index(c).is_some())
}

/// 양성 모음 어간인지 (마지막으로 결정되는 모음이 ㅏ/ㅑ/ㅗ)
///
/// ㅡ는 건너뛰고 그 앞 모음으로 판정합니다.
pub fn is_positive(s: &str) -> bool {
    for c in s.chars().rev() {
        let jung = match decompose_syllable(c) {
            Some((_, jung, _)) => jung,
            None => match jungseong_index(c) {
                Some(jung) => jung,
                None => continue,
            },
        };
        match jung {
            0 | 2 | 8 => return true,
            18 => continue,
            _ => return false,
        }
    }
    false
}

/// 형태소가 앞 어간에 요구하는 끝소리 조건
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    IsVowel,
    IsVocalic,
    IsVocalicH,
    NotVowel,
    NotVocalic,
    NotVocalicH,
}

impl Gate {
    /// 어간 형태가 조건을 만족하는지
    pub fn holds(self, stem: &str) -> bool {
        match self {
            Gate::IsVowel => is_vowel_final(stem),
            Gate::IsVocalic => is_vocalic_final(stem),
            Gate::IsVocalicH => is_vocalic_h_final(stem),
            Gate::NotVowel => !is_vowel_final(stem),
            Gate::NotVocalic => !is_vocalic_final(stem),
            Gate::NotVocalicH => !is_vocalic_h_final(stem),
        }
    }

    /// 끝소리 확률에서 조건 추출
    ///
    /// 여섯 후보 중 가장 큰 확률이 `threshold` 이상이면 해당 조건을,
    /// 아니면 `None`(무조건 결합)을 돌려줍니다. 동률이면 앞 후보가 이깁니다.
    pub fn classify(p_vowel: f64, p_vocalic: f64, p_vocalic_h: f64, threshold: f64) -> Option<Gate> {
        let candidates = [
            (p_vowel, Gate::IsVowel),
            (p_vocalic, Gate::IsVocalic),
            (p_vocalic_h, Gate::IsVocalicH),
            (1.0 - p_vowel, Gate::NotVowel),
            (1.0 - p_vocalic, Gate::NotVocalic),
            (1.0 - p_vocalic_h, Gate::NotVocalicH),
        ];
        let (best, gate) = candidates
            .into_iter()
            .fold((f64::NEG_INFINITY, Gate::IsVowel), |acc, cand| {
                if cand.0 > acc.0 {
                    cand
                } else {
                    acc
                }
            });
        (best >= threshold).then_some(gate)
    }
}

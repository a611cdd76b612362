//! 유니코드 한글 조합/분해 유틸리티
//!
//! 모델 파일의 형태는 "종성 분리형"으로 저장됩니다: 받침이 있는 음절은
//! 받침 없는 음절 + 조합형 종성 자모(U+11A8~U+11C2)로 풀어 씁니다.
//! 예: `먹` → `머` + `ᆨ`

/// 한글 음절 시작 코드포인트 (가)
const HANGUL_SYLLABLE_BASE: u32 = 0xAC00;
/// 한글 음절 마지막 코드포인트 (힣)
const HANGUL_SYLLABLE_LAST: u32 = 0xD7A3;

/// 초성 개수
pub const CHOSEONG_COUNT: u32 = 19;
/// 중성 개수
const JUNGSEONG_COUNT: u32 = 21;
/// 종성 개수 (종성 없음 포함)
const JONGSEONG_COUNT: u32 = 28;

/// 호환용 모음 자모 범위 (ㅏ ~ ㅣ)
const JAMO_VOWEL_FIRST: u32 = 0x314F;
const JAMO_VOWEL_LAST: u32 = 0x3163;

/// 조합형 종성 자모 범위 (ᆨ ~ ᇂ)
const CONJOINING_JONG_FIRST: u32 = 0x11A8;
const CONJOINING_JONG_LAST: u32 = 0x11C2;

/// 자모 조합 primitive가 거부한 입력
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JamoError {
    /// 초성 인덱스 범위 초과
    #[error("초성 인덱스 범위 초과: {0}")]
    ChoseongOutOfRange(u32),
    /// 호환용 모음 자모가 아님
    #[error("모음 자모가 아닙니다: {0:?}")]
    NotVowelJamo(char),
    /// 받침 없는 음절 뒤에 오지 않은 종성 자모
    #[error("결합할 음절이 없는 종성: {0:?}")]
    OrphanCoda(char),
}

/// 초성/중성/종성 인덱스로 완성된 한글 유니코드 생성
/// - choseong: 초성 인덱스 (0~18)
/// - jungseong: 중성 인덱스 (0~20)
/// - jongseong: 종성 인덱스 (0~27, 0 = 종성 없음)
pub fn compose_syllable(choseong: u32, jungseong: u32, jongseong: u32) -> Option<char> {
    if choseong >= CHOSEONG_COUNT || jungseong >= JUNGSEONG_COUNT || jongseong >= JONGSEONG_COUNT {
        return None;
    }
    let code = HANGUL_SYLLABLE_BASE
        + (choseong * JUNGSEONG_COUNT + jungseong) * JONGSEONG_COUNT
        + jongseong;
    char::from_u32(code)
}

/// 완성형 한글을 초성/중성/종성 인덱스로 분해
/// 반환: (초성 인덱스, 중성 인덱스, 종성 인덱스)
pub fn decompose_syllable(c: char) -> Option<(u32, u32, u32)> {
    let code = c as u32;
    if !(HANGUL_SYLLABLE_BASE..=HANGUL_SYLLABLE_LAST).contains(&code) {
        return None;
    }
    let offset = code - HANGUL_SYLLABLE_BASE;
    let jongseong = offset % JONGSEONG_COUNT;
    let jungseong = (offset / JONGSEONG_COUNT) % JUNGSEONG_COUNT;
    let choseong = offset / (JUNGSEONG_COUNT * JONGSEONG_COUNT);
    Some((choseong, jungseong, jongseong))
}

/// 호환용 모음 자모(ㅏ~ㅣ)의 중성 인덱스
pub fn jungseong_index(vowel: char) -> Option<u32> {
    let code = vowel as u32;
    if (JAMO_VOWEL_FIRST..=JAMO_VOWEL_LAST).contains(&code) {
        Some(code - JAMO_VOWEL_FIRST)
    } else {
        None
    }
}

/// 초성 인덱스와 모음 자모로 받침 없는 음절 생성
///
/// 모음 조화 규칙 전개에 사용됩니다. 범위를 벗어난 입력은 에러로 돌려줍니다.
pub fn compose_open_syllable(choseong: u32, vowel: char) -> Result<char, JamoError> {
    let jung = jungseong_index(vowel).ok_or(JamoError::NotVowelJamo(vowel))?;
    compose_syllable(choseong, jung, 0).ok_or(JamoError::ChoseongOutOfRange(choseong))
}

/// 종성 인덱스(1~27)를 조합형 종성 자모로 변환
fn jongseong_to_conjoining(jong: u32) -> Option<char> {
    if jong == 0 || jong >= JONGSEONG_COUNT {
        return None;
    }
    char::from_u32(CONJOINING_JONG_FIRST + jong - 1)
}

/// 조합형 종성 자모를 종성 인덱스로 변환
fn conjoining_to_jongseong(c: char) -> Option<u32> {
    let code = c as u32;
    if (CONJOINING_JONG_FIRST..=CONJOINING_JONG_LAST).contains(&code) {
        Some(code - CONJOINING_JONG_FIRST + 1)
    } else {
        None
    }
}

/// 받침 있는 음절을 받침 없는 음절 + 종성 자모로 분리
///
/// 한글 음절이 아닌 문자는 그대로 둡니다.
pub fn split_coda(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 2);
    for c in s.chars() {
        match decompose_syllable(c) {
            Some((cho, jung, jong)) if jong > 0 => {
                // 분해 결과로 다시 조합하므로 항상 성공
                if let (Some(open), Some(coda)) =
                    (compose_syllable(cho, jung, 0), jongseong_to_conjoining(jong))
                {
                    out.push(open);
                    out.push(coda);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// 종성 분리형을 완성형으로 되돌림
pub fn join_coda(s: &str) -> Result<String, JamoError> {
    let mut out: Vec<char> = Vec::with_capacity(s.len());
    for c in s.chars() {
        let Some(jong) = conjoining_to_jongseong(c) else {
            out.push(c);
            continue;
        };
        let joined = out
            .last()
            .and_then(|&prev| decompose_syllable(prev))
            .filter(|&(_, _, prev_jong)| prev_jong == 0)
            .and_then(|(cho, jung, _)| compose_syllable(cho, jung, jong))
            .ok_or(JamoError::OrphanCoda(c))?;
        out.pop();
        out.push(joined);
    }
    Ok(out.into_iter().collect())
}

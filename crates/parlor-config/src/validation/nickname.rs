//! Nickname rule validation (lengths and pattern).

use crate::schema::ParlorConfig;

use super::helpers::validate_range;

pub(crate) fn validate_nickname(errors: &mut Vec<String>, config: &ParlorConfig) {
    let rules = &config.nickname;
    validate_range(errors, "nickname.min_length", rules.min_length, 1, 10);
    validate_range(errors, "nickname.max_length", rules.max_length, 5, 50);
    if rules.min_length > rules.max_length {
        errors.push(format!(
            "nickname.min_length = {} exceeds nickname.max_length = {}",
            rules.min_length, rules.max_length
        ));
    }
    if let Err(e) = regex::Regex::new(&rules.pattern) {
        errors.push(format!("nickname.pattern is not a valid regex: {e}"));
    }
}

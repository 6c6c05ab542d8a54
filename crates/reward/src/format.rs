use regex::Regex;

/// Strict structural check: the whole prediction must be exactly one
/// think-block followed by one answer-block (whitespace between them is
/// allowed). Anything else - missing tag, trailing text, reversed order -
/// scores 0.0.
pub fn format_reward(predict_str: &str) -> f64 {
    let pattern = Regex::new(r"(?s)^<think>.*?</think>\s*<answer>.*?</answer>$").unwrap();
    if pattern.is_match(predict_str) { 1.0 } else { 0.0 }
}

/// Length-proximity score for the reasoning trace: 1 minus the relative
/// distance of the total think-block length from the target, floored at 0.
/// Think blocks spanning line breaks are intentionally not counted, same
/// as the reward the models were trained against.
pub fn think_length_reward(predict_str: &str, target_len: usize) -> f64 {
    let pattern = Regex::new(r"<think>(.*?)</think>").unwrap();
    let total_length: usize = pattern
        .captures_iter(predict_str)
        .map(|cap| cap[1].chars().count())
        .sum();

    let target = target_len as f64;
    let score = 1.0 - (total_length as f64 - target).abs() / target;
    score.max(0.0)
}

/// Content of the first answer-block, trimmed, or `None` when absent.
pub fn answer_content(predict_str: &str) -> Option<&str> {
    let pattern = Regex::new(r"(?s)<answer>(.*?)</answer>").unwrap();
    pattern
        .captures(predict_str)
        .map(|cap| cap.get(1).unwrap().as_str().trim())
}

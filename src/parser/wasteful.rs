//! Wasteful-spend detector ("spending police")
//!
//! Blocklist keyword match over the item name; a hit returns one of the
//! canned cautionary messages, picked at random.

use rand::seq::SliceRandom;

const WASTEFUL_KEYWORDS: &[&str] = &[
    "game", "nạp", "nap", "skin", "gacha", "trà sữa", "tra sua", "toco", "mixue",
    "phim", "netflix", "đồ chơi", "do choi", "mô hình", "mo hinh", "nhậu", "nhau",
    "pubg", "lol", "liên quân", "lien quan", "mobile legend", "genshin", "top up",
    "thẻ game", "the game", "card", "gift code", "code", "vip", "premium",
];

const WASTEFUL_WARNINGS: &[&str] = &[
    "Tiền không phải lá mít đâu nhé! 💸",
    "Lại tốn tiền vào cái này rồi, chán thanh niên! 😒",
    "Bớt bớt lại đi, cuối tháng ăn mì gói bây giờ! 🍜",
    "Tiêu tiền như nước, rồi lại than nghèo! 💧",
    "Cẩn thận kẻo hết tiền trước khi hết tháng! ⚠️",
    "Nhớ tiết kiệm một chút, đừng phung phí quá! 💰",
    "Lại chi tiêu không cần thiết rồi, cẩn thận nhé! 🚨",
    "Tiền kiếm được khó lắm, đừng vứt đi như vậy! 😤",
    "Có tiền thì tiêu, không có tiền thì... than! 😅",
    "Nhớ mục tiêu tiết kiệm của mình nhé! 🎯",
];

/// Check the item name against the blocklist; on a hit return a random
/// cautionary message, otherwise `None`.
pub fn wasteful_warning(item_name: &str) -> Option<&'static str> {
    let item_lower = item_name.to_lowercase();

    let hit = WASTEFUL_KEYWORDS
        .iter()
        .any(|keyword| item_lower.contains(keyword));

    if hit {
        WASTEFUL_WARNINGS.choose(&mut rand::thread_rng()).copied()
    } else {
        None
    }
}

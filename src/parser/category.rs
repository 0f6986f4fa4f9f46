//! Keyword-lookup category classifier
//!
//! Literal data tables, not code: keyword lists carry both diacritic and
//! diacritic-free spellings as separate entries because there is no
//! Unicode-folding step. Categories are checked in a fixed priority
//! order and the first hit wins; keywords match by substring except
//! for a short list of single-syllable verbs that match whole words.

use crate::models::Category;

const FOOD_KEYWORDS: &[&str] = &[
    "phở", "pho", "cơm", "com", "bún", "bun", "nước", "nuoc", "cf", "cafe", "cà phê", "ca phe",
    "trà", "tra", "chè", "che", "bánh", "banh", "mì", "mi", "bánh mì", "banh mi", "xôi", "xoi",
    "cháo", "chao", "súp", "sup", "lẩu", "lau", "nướng", "nuong", "gà", "ga", "thịt", "thit",
    "cá", "ca", "tôm", "tom", "rau", "đồ ăn", "do an", "ăn", "an", "uống", "uong", "nước uống",
    "nuoc uong", "sữa", "sua", "kem", "bánh kẹo", "banh keo", "snack", "kẹo", "keo",
];

const TRANSPORT_KEYWORDS: &[&str] = &[
    "xăng", "xang", "xe", "grab", "be", "uber", "taxi", "gửi xe", "gui xe", "đỗ xe", "do xe",
    "bãi xe", "bai xe", "vé", "ve", "ticket", "máy bay", "may bay", "tàu", "tau", "xe bus",
    "xe buýt", "xe buyt", "đi lại", "di lai", "vận chuyển", "van chuyen", "ship", "giao hàng",
    "giao hang", "đi", "di", "về", "ve", "đi về", "di ve",
];

const EDUCATION_KEYWORDS: &[&str] = &[
    "vở", "vo", "sách", "sach", "bút", "but", "học", "hoc", "sách giáo khoa", "sach giao khoa",
    "tài liệu", "tai lieu", "photocopy", "photo", "in", "mực", "muc", "bút chì", "but chi",
    "thước", "thuoc", "compa", "máy tính", "may tinh", "calculator", "học phí", "hoc phi",
    "phí học", "phi hoc", "đăng ký", "dang ky", "đăng kí", "dang ki", "khóa học", "khoa hoc",
];

/// Priority order: Food, Transport, Education. First keyword match wins.
const TABLES: &[(Category, &[&str])] = &[
    (Category::Food, FOOD_KEYWORDS),
    (Category::Transport, TRANSPORT_KEYWORDS),
    (Category::Education, EDUCATION_KEYWORDS),
];

/// Single-syllable verbs that are substrings of unrelated words
/// ("ăn" inside "xăng", "đi" inside "điện"). These match whole
/// whitespace-delimited words only; every other keyword stays a plain
/// substring.
const WHOLE_WORD_ONLY: &[&str] = &["ăn", "an", "uống", "uong", "đi", "di", "về", "ve", "in"];

fn keyword_hit(item_lower: &str, keyword: &str) -> bool {
    if WHOLE_WORD_ONLY.contains(&keyword) {
        item_lower.split_whitespace().any(|word| word == keyword)
    } else {
        item_lower.contains(keyword)
    }
}

/// Map an item name to a category by keyword membership. Pure and
/// deterministic; the only normalization is lowercasing.
pub fn categorize(item_name: &str) -> Category {
    let item_lower = item_name.to_lowercase();

    for (category, keywords) in TABLES {
        for keyword in keywords.iter() {
            if keyword_hit(&item_lower, keyword) {
                return *category;
            }
        }
    }

    Category::Other
}

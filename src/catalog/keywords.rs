use crate::models::ProjectType;

/// Category key → keywords that signal the category in a free-text query
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "youtube",
        &[
            "youtube", "動画", "ユーチューブ", "投稿", "チャンネル", "ショート", "切り抜き", "音楽",
            "台本", "撮影", "編集",
        ],
    ),
    (
        "ec",
        &[
            "ec", "物販", "出品", "商品", "在庫", "ebay", "楽天", "amazon", "etsy", "suzuri",
            "printify", "ステッカー", "検品", "仕入", "転売", "せどり",
        ],
    ),
    (
        "sns",
        &[
            "sns", "threads", "line", "instagram", "投稿", "予約", "メッセージ", "通知",
        ],
    ),
    (
        "shift",
        &[
            "シフト", "勤怠", "出退勤", "スタッフ", "オペレーター", "夜勤", "超勤", "勤務",
        ],
    ),
    (
        "document",
        &[
            "帳票", "書類", "pdf", "カレンダー", "日報", "伝票", "版数", "棚割", "画像挿入", "請求書",
            "納品書", "見積",
        ],
    ),
    (
        "accounting",
        &[
            "経理", "給与", "税", "買掛", "支給", "控除", "集計", "精算", "売上", "経費",
        ],
    ),
    (
        "education",
        &[
            "学校", "成績", "座席", "時間割", "生徒", "児童", "教育", "賞状", "名簿", "先生", "授業",
        ],
    ),
    (
        "realestate",
        &["不動産", "物件", "地主", "借地", "賃貸", "管理", "契約"],
    ),
    (
        "email",
        &[
            "メール", "gmail", "outlook", "送信", "一括", "転記", "問い合わせ",
        ],
    ),
    (
        "data",
        &[
            "分析", "データ", "グラフ", "パレート", "統計", "レポート", "seo", "順位", "可視化",
        ],
    ),
];

/// Technology → keywords. Declaration order decides ties.
const TECH_KEYWORDS: &[(ProjectType, &[&str])] = &[
    (
        ProjectType::Excel,
        &["excel", "エクセル", "vba", "マクロ", "関数", "スプレッドシート"],
    ),
    (
        ProjectType::Python,
        &["python", "パイソン", "自動化", "api", "スクレイピング", "bot"],
    ),
];

/// Keyword tables used by the local matcher
///
/// Keywords are expected in lowercase; queries are lowercased before matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordTables {
    pub categories: Vec<(String, Vec<String>)>,
    pub technologies: Vec<(ProjectType, Vec<String>)>,
}

impl KeywordTables {
    /// The tables shipped with the site
    pub fn builtin() -> Self {
        Self {
            categories: CATEGORY_KEYWORDS
                .iter()
                .map(|(key, words)| (key.to_string(), to_owned(words)))
                .collect(),
            technologies: TECH_KEYWORDS
                .iter()
                .map(|(tech, words)| (*tech, to_owned(words)))
                .collect(),
        }
    }

    pub fn category_keywords(&self, key: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, words)| words.as_slice())
    }
}

impl Default for KeywordTables {
    fn default() -> Self {
        Self::builtin()
    }
}

fn to_owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

//! Builtin Piece Keywords
//!
//! 部位ごとのキーワード定義。
//! アイテム名からの部位推定と、カラー名による部位フィルタの両方で使用する。

use super::PieceCategory;

/// 部位キーワード定義（推定順）
pub const BUILTIN_PIECES: &[PieceKeywords] = &[
    PieceKeywords {
        category: PieceCategory::Helmet,
        keywords: &["hat", "helm", "crown", "hood", "cap", "mask"],
    },
    PieceKeywords {
        category: PieceCategory::Chestplate,
        keywords: &[
            "jacket", "chest", "tunic", "shirt", "vest", "robe", "coat", "plate",
        ],
    },
    PieceKeywords {
        category: PieceCategory::Leggings,
        keywords: &["trousers", "leggings", "pants", "legs", "shorts"],
    },
    PieceKeywords {
        category: PieceCategory::Boots,
        keywords: &["shoes", "boots", "sneakers", "feet", "sandals"],
    },
];

/// 3ピースセット専用カラーの識別子
pub const THREE_PIECE_MARKER: &str = "3p";

/// 部位キーワードの静的定義
#[derive(Debug, Clone)]
pub struct PieceKeywords {
    /// 対象の部位
    pub category: PieceCategory,
    /// 小文字のキーワード（部分一致）
    pub keywords: &'static [&'static str],
}

impl PieceKeywords {
    /// 小文字化済みの文字列がいずれかのキーワードを含むか
    pub fn matches_lower(&self, lower: &str) -> bool {
        self.keywords.iter().any(|k| lower.contains(k))
    }
}

/// 部位のキーワード定義を取得
pub fn keywords_for(category: PieceCategory) -> Option<&'static PieceKeywords> {
    BUILTIN_PIECES.iter().find(|p| p.category == category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_pieces_cover_all_known_categories() {
        for category in [
            PieceCategory::Helmet,
            PieceCategory::Chestplate,
            PieceCategory::Leggings,
            PieceCategory::Boots,
        ] {
            assert!(keywords_for(category).is_some(), "{:?}", category);
        }
        assert!(keywords_for(PieceCategory::Unknown).is_none());
    }

    #[test]
    fn test_keywords_are_lowercase() {
        for piece in BUILTIN_PIECES {
            for k in piece.keywords {
                assert_eq!(*k, k.to_lowercase());
            }
        }
    }
}

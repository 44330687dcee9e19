//! # Piece Module
//!
//! アイテム名から装備部位（helmet / chestplate / leggings / boots）を推定し、
//! カラー名が部位に使用可能かを判定する。
//!
//! ## モジュール構成
//!
//! - `builtin`: ビルトインの部位キーワード定義
//!
//! ## 使用例
//!
//! ```rust
//! use seymour_core::piece::PieceCategory;
//!
//! assert_eq!(PieceCategory::infer("Velvet Top Hat"), PieceCategory::Helmet);
//! assert_eq!(PieceCategory::infer("Satin Trousers"), PieceCategory::Leggings);
//! assert_eq!(PieceCategory::infer("Mystery Item"), PieceCategory::Unknown);
//!
//! // 部位キーワードを持たない汎用カラーはどの部位にも使える
//! assert!(PieceCategory::Boots.accepts_color("Pure Red"));
//! assert!(!PieceCategory::Boots.accepts_color("Red Chestplate"));
//! ```

mod builtin;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use builtin::{keywords_for, PieceKeywords, BUILTIN_PIECES, THREE_PIECE_MARKER};

/// 装備部位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceCategory {
    Helmet,
    Chestplate,
    Leggings,
    Boots,
    #[default]
    Unknown,
}

impl PieceCategory {
    /// アイテム名から部位を推定（大文字小文字を区別しない）
    ///
    /// キーワード表の順に評価し、最初に一致した部位を返す。
    pub fn infer(item_name: &str) -> Self {
        let lower = item_name.to_lowercase();
        BUILTIN_PIECES
            .iter()
            .find(|p| p.matches_lower(&lower))
            .map(|p| p.category)
            .unwrap_or(Self::Unknown)
    }

    /// カラー名がこの部位に使用可能か
    ///
    /// - 自部位のキーワードを含む → 使用可
    /// - どの部位キーワードも含まない（汎用カラー） → 使用可
    /// - 他部位のキーワードのみ含む → 使用不可
    /// - Unknown は常に使用可
    pub fn accepts_color(&self, color_name: &str) -> bool {
        let Some(own) = keywords_for(*self) else {
            return true;
        };
        let lower = color_name.to_lowercase();
        if own.matches_lower(&lower) {
            return true;
        }
        !BUILTIN_PIECES.iter().any(|p| p.matches_lower(&lower))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Helmet => "helmet",
            Self::Chestplate => "chestplate",
            Self::Leggings => "leggings",
            Self::Boots => "boots",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PieceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PieceCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "helmet" => Ok(Self::Helmet),
            "chestplate" => Ok(Self::Chestplate),
            "leggings" => Ok(Self::Leggings),
            "boots" => Ok(Self::Boots),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown piece category: {}", other)),
        }
    }
}

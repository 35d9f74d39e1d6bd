//! 等级计算
//!
//! 纯函数：总积分 -> 等级。每次积分变动后在同一事务内重新计算。
//!
//! | 总积分 | 等级 |
//! |---|---|
//! | 0–49 | Beginner |
//! | 50–199 | Eco Explorer |
//! | 200–499 | Eco Warrior |
//! | 500–999 | Eco Champion |
//! | 1000+ | Eco Master |

use crate::models::Level;

/// 各等级的起始积分，按等级从高到低排列
const THRESHOLDS: [(i64, Level); 5] = [
    (1000, Level::EcoMaster),
    (500, Level::EcoChampion),
    (200, Level::EcoWarrior),
    (50, Level::EcoExplorer),
    (0, Level::Beginner),
];

/// 根据总积分计算等级
///
/// 负数不会由发放流程产生，按 Beginner 处理
pub fn level_of(points: i64) -> Level {
    THRESHOLDS
        .iter()
        .find(|(min, _)| points >= *min)
        .map(|(_, level)| *level)
        .unwrap_or(Level::Beginner)
}

impl Level {
    /// 达到该等级所需的最低积分
    pub fn min_points(&self) -> i64 {
        match self {
            Self::Beginner => 0,
            Self::EcoExplorer => 50,
            Self::EcoWarrior => 200,
            Self::EcoChampion => 500,
            Self::EcoMaster => 1000,
        }
    }

    /// 下一等级，Eco Master 没有下一级
    pub fn next(&self) -> Option<Level> {
        match self {
            Self::Beginner => Some(Self::EcoExplorer),
            Self::EcoExplorer => Some(Self::EcoWarrior),
            Self::EcoWarrior => Some(Self::EcoChampion),
            Self::EcoChampion => Some(Self::EcoMaster),
            Self::EcoMaster => None,
        }
    }
}

/// 距离下一等级还差多少积分
pub fn points_to_next_level(points: i64) -> Option<i64> {
    level_of(points)
        .next()
        .map(|next| next.min_points() - points.max(0))
}

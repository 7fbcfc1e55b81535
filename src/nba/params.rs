    use core::fmt;
    use std::{fmt::Display, str::FromStr};
    use anyhow::{anyhow, Result};
    use chrono::{Datelike, NaiveDate};

    /// ESPN splits every per-game statistics payload into these categories.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum StatCategory {
        Defensive,
        General,
        Offensive,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum StatComponent {
        Points,
        Rebounds,
        Assists,
        Threes,
        Blocks,
        Steals,
    }

    /// A prop market offered by the sportsbook, single or composite.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum StatType {
        Points,
        Assists,
        Threes,
        Rebounds,
        Blocks,
        Steals,
        PointsRebounds,
        ReboundsAssists,
        PointsAssistsRebounds,
        PointsAssists,
    }

    pub enum TeamID {
        ID(String)
    }

    pub enum AthleteID {
        ID(String)
    }

    pub enum Page {
        P(u32)
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Season {
        S(i32)
    }

    impl StatCategory {
        pub fn name(&self) -> &'static str {
            match self {
                StatCategory::Defensive => "defensive",
                StatCategory::General => "general",
                StatCategory::Offensive => "offensive",
            }
        }

        // Position inside `splits.categories` when the payload carries no names.
        pub fn position(&self) -> usize {
            match self {
                StatCategory::Defensive => 0,
                StatCategory::General => 1,
                StatCategory::Offensive => 2,
            }
        }
    }

    impl StatComponent {
        pub fn abbreviation(&self) -> &'static str {
            match self {
                StatComponent::Points => "PTS",
                StatComponent::Rebounds => "REB",
                StatComponent::Assists => "AST",
                StatComponent::Threes => "3PM",
                StatComponent::Blocks => "BLK",
                StatComponent::Steals => "STL",
            }
        }

        pub fn category(&self) -> StatCategory {
            match self {
                StatComponent::Points | StatComponent::Assists | StatComponent::Threes => StatCategory::Offensive,
                StatComponent::Rebounds => StatCategory::General,
                StatComponent::Blocks | StatComponent::Steals => StatCategory::Defensive,
            }
        }
    }

    impl StatType {
        pub const ALL: [StatType; 10] = [
            StatType::Points,
            StatType::Assists,
            StatType::Threes,
            StatType::Rebounds,
            StatType::Blocks,
            StatType::Steals,
            StatType::PointsRebounds,
            StatType::ReboundsAssists,
            StatType::PointsAssistsRebounds,
            StatType::PointsAssists,
        ];

        pub fn components(&self) -> &'static [StatComponent] {
            use StatComponent::*;
            match self {
                StatType::Points => &[Points],
                StatType::Assists => &[Assists],
                StatType::Threes => &[Threes],
                StatType::Rebounds => &[Rebounds],
                StatType::Blocks => &[Blocks],
                StatType::Steals => &[Steals],
                StatType::PointsRebounds => &[Points, Rebounds],
                StatType::ReboundsAssists => &[Rebounds, Assists],
                StatType::PointsAssistsRebounds => &[Points, Assists, Rebounds],
                StatType::PointsAssists => &[Points, Assists],
            }
        }

        pub fn is_composite(&self) -> bool {
            self.components().len() > 1
        }

        /// Odds provider market key.
        pub fn market(&self) -> &'static str {
            match self {
                StatType::Points => "player_points",
                StatType::Assists => "player_assists",
                StatType::Threes => "player_threes",
                StatType::Rebounds => "player_rebounds",
                StatType::Blocks => "player_blocks",
                StatType::Steals => "player_steals",
                StatType::PointsRebounds => "player_points_rebounds",
                StatType::ReboundsAssists => "player_rebounds_assists",
                StatType::PointsAssistsRebounds => "player_points_rebounds_assists",
                StatType::PointsAssists => "player_points_assists",
            }
        }

        pub fn abbreviation(&self) -> &'static str {
            match self {
                StatType::Points => "PTS",
                StatType::Assists => "AST",
                StatType::Threes => "3PM",
                StatType::Rebounds => "REB",
                StatType::Blocks => "BLK",
                StatType::Steals => "STL",
                StatType::PointsRebounds => "PTS+REB",
                StatType::ReboundsAssists => "REB+AST",
                StatType::PointsAssistsRebounds => "PTS+AST+REB",
                StatType::PointsAssists => "PTS+AST",
            }
        }

        /// Comma separated market list for a single odds request.
        pub fn all_markets() -> String {
            StatType::ALL.iter().map(|s| s.market()).collect::<Vec<&str>>().join(",")
        }
    }

    impl FromStr for StatType {
        type Err = anyhow::Error;

        fn from_str(s: &str) -> Result<Self> {
            let wanted = s.trim().to_uppercase();
            // Composite props are accepted in any component order (PTS+REB+AST).
            let mut wanted_parts: Vec<&str> = wanted.split('+').map(|p| p.trim()).collect();
            wanted_parts.sort_unstable();
            StatType::ALL
                .iter()
                .find(|stat| {
                    if stat.market().eq_ignore_ascii_case(s.trim()) {
                        return true;
                    }
                    let mut parts: Vec<&str> = stat.components().iter().map(|c| c.abbreviation()).collect();
                    parts.sort_unstable();
                    parts == wanted_parts
                })
                .copied()
                .ok_or_else(|| anyhow!("unknown prop '{}', expected one of PTS, AST, 3PM, REB, BLK, STL, PTS+REB, REB+AST, PTS+AST+REB, PTS+AST", s))
        }
    }

    impl Display for StatType {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "{}", self.abbreviation())
        }
    }

    impl Display for TeamID {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            match self {
                TeamID::ID(id) => write!(f, "{}", id)
            }
        }
    }

    impl Display for AthleteID {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            match self {
                AthleteID::ID(id) => write!(f, "{}", id)
            }
        }
    }

    impl Display for Page {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            match self {
                Page::P(page) => write!(f, "page={}", page)
            }
        }
    }

    impl Display for Season {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            match self {
                Season::S(year) => write!(f, "{}", year)
            }
        }
    }

    impl Season {
        /// ESPN names a season after the year it ends in; it rolls over in October.
        pub fn containing(date: NaiveDate) -> Season {
            if date.month() >= 10 {
                Season::S(date.year() + 1)
            } else {
                Season::S(date.year())
            }
        }
    }

    impl Default for Season {
        fn default() -> Self {
            Season::containing(chrono::Utc::now().date_naive())
        }
    }

    impl FromStr for Season {
        type Err = anyhow::Error;

        fn from_str(s: &str) -> Result<Self> {
            let year: i32 = s.trim().parse().map_err(|_| anyhow!("invalid season '{}', expected a year like 2024", s))?;
            Ok(Season::S(year))
        }
    }

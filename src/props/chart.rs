use super::aggregate::is_hit;
use super::record::GameRecord;

pub const HIT_COLOR: &str = "#37d98f";
pub const MISS_COLOR: &str = "#ec3b47";
pub const NEUTRAL_COLOR: &str = "#9ca3af";
pub const LINE_LABEL: &str = "Betting Line";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarColor {
    Hit,
    Miss,
    Neutral,
}

impl BarColor {
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => BarColor::Hit,
            Some(false) => BarColor::Miss,
            None => BarColor::Neutral,
        }
    }

    pub fn hex(&self) -> &'static str {
        match self {
            BarColor::Hit => HIT_COLOR,
            BarColor::Miss => MISS_COLOR,
            BarColor::Neutral => NEUTRAL_COLOR,
        }
    }

    /// 24-bit foreground escape for `hex()`.
    fn ansi(&self) -> String {
        let hex = self.hex().trim_start_matches('#');
        let channel = |at: usize| u8::from_str_radix(hex.get(at..at + 2).unwrap_or("00"), 16).unwrap_or(0);
        format!("\x1b[38;2;{};{};{}m", channel(0), channel(2), channel(4))
    }
}

/// Horizontal annotation drawn at the line value.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceLine {
    pub value: f64,
    pub label: &'static str,
}

/// Index-aligned chart data for one window.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartSeries {
    pub categories: Vec<String>,
    pub values: Vec<f64>,
    /// `None` for every bar when there is no line.
    pub color_flags: Vec<Option<bool>>,
    pub reference_line: Option<ReferenceLine>,
}

pub fn build(window: &[GameRecord], line: Option<f64>) -> ChartSeries {
    ChartSeries {
        categories: window.iter().map(|g| g.category()).collect(),
        values: window.iter().map(|g| g.stat_value).collect(),
        color_flags: window
            .iter()
            .map(|g| line.map(|l| is_hit(g.stat_value, l)))
            .collect(),
        reference_line: line.map(|value| ReferenceLine { value, label: LINE_LABEL }),
    }
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn colors(&self) -> Vec<BarColor> {
        self.color_flags.iter().map(|f| BarColor::from_flag(*f)).collect()
    }

    /// Draws one horizontal bar per game, scaled from zero.
    pub fn render(&self, width: usize, ansi: bool) -> String {
        if self.is_empty() {
            return String::from("  no games in window\n");
        }
        let line = self.reference_line.as_ref().map(|r| r.value);
        let top = self
            .values
            .iter()
            .copied()
            .chain(line)
            .fold(0.0_f64, f64::max);
        let scale = |v: f64| -> usize {
            if top <= 0.0 {
                return 0;
            }
            ((v.max(0.0) / top) * width as f64).round() as usize
        };
        let marker = line.map(scale);
        let label_width = self.categories.iter().map(|c| c.chars().count()).max().unwrap_or(0);
        let colors = self.colors();

        let mut out = String::new();
        for (i, category) in self.categories.iter().enumerate() {
            let value = self.values[i];
            let filled = scale(value);
            let mut bar = String::new();
            let mut rest = String::new();
            for col in 0..=width {
                match (col < filled, marker == Some(col)) {
                    (true, true) => bar.push('╋'),
                    (true, false) => bar.push('█'),
                    (false, true) => rest.push('┊'),
                    (false, false) => rest.push(' '),
                }
            }
            let painted = if ansi {
                format!("{}{}\x1b[0m", colors[i].ansi(), bar)
            } else {
                bar
            };
            out.push_str(&format!(
                "  {:<w$} │{}{} {}\n",
                category,
                painted,
                rest.trim_end(),
                format_stat(value),
                w = label_width
            ));
        }
        if let Some(reference) = &self.reference_line {
            out.push_str(&format!(
                "  {:<w$}  ┊ {}: {}\n",
                "",
                reference.label,
                format_stat(reference.value),
                w = label_width
            ));
        }
        out
    }
}

/// Whole numbers without decimals, everything else with one.
pub fn format_stat(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

use ratatui::style::Color;

/// 9-class diverging RdBu palette, ordered cold to hot.
/// This is the reverse of Brewer's listing, which starts at dark red.
pub const RDBU_9: [Color; 9] = [
    Color::Rgb(0x21, 0x66, 0xac),
    Color::Rgb(0x43, 0x93, 0xc3),
    Color::Rgb(0x92, 0xc5, 0xde),
    Color::Rgb(0xd1, 0xe5, 0xf0),
    Color::Rgb(0xf7, 0xf7, 0xf7),
    Color::Rgb(0xfd, 0xdb, 0xc7),
    Color::Rgb(0xf4, 0xa5, 0x82),
    Color::Rgb(0xd6, 0x60, 0x4d),
    Color::Rgb(0xb2, 0x18, 0x2b),
];

/// Neutral fill for missing and out-of-scale values (#d9d9d9)
pub const NAN_COLOR: Color = Color::Rgb(0xd9, 0xd9, 0xd9);

/// Maps a scalar linearly onto a discrete palette between `low` and `high`
#[derive(Clone, Debug)]
pub struct LinearColorMapper {
    pub palette: Vec<Color>,
    pub low: f64,
    pub high: f64,
    pub nan_color: Color,
    /// Color below `low`; `None` clamps to the first palette entry
    pub low_color: Option<Color>,
    /// Color above `high`; `None` clamps to the last palette entry
    pub high_color: Option<Color>,
}

impl LinearColorMapper {
    pub fn new(palette: Vec<Color>, low: f64, high: f64, nan_color: Color) -> Self {
        Self {
            palette,
            low,
            high,
            nan_color,
            low_color: None,
            high_color: None,
        }
    }

    /// Anomaly scale: -3..+3, everything off-scale or missing drawn neutral
    pub fn anomaly() -> Self {
        let mut mapper = Self::new(RDBU_9.to_vec(), -3.0, 3.0, NAN_COLOR);
        mapper.low_color = Some(NAN_COLOR);
        mapper.high_color = Some(NAN_COLOR);
        mapper
    }

    pub fn map(&self, value: Option<f64>) -> Color {
        let Some(v) = value.filter(|v| v.is_finite()) else {
            return self.nan_color;
        };
        if self.palette.is_empty() {
            return self.nan_color;
        }

        let last = self.palette.len() - 1;
        if v < self.low {
            return self.low_color.unwrap_or(self.palette[0]);
        }
        if v > self.high {
            return self.high_color.unwrap_or(self.palette[last]);
        }

        let span = self.high - self.low;
        if span <= 0.0 {
            return self.palette[last];
        }
        let idx = ((v - self.low) / span * self.palette.len() as f64).floor() as usize;
        self.palette[idx.min(last)]
    }

    /// Lower bound of each palette bin, for legend ticks
    pub fn bin_edges(&self) -> impl Iterator<Item = f64> + '_ {
        let step = (self.high - self.low) / self.palette.len() as f64;
        (0..=self.palette.len()).map(move |i| self.low + step * i as f64)
    }
}

use serde::Serialize;

/// Counts of parsed grades for one subject, student or class.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GradeCounts {
    pub count5: usize,
    pub count4: usize,
    pub count3: usize,
    /// Every parsed grade, including 1s and 2s.
    pub total: usize,
}

impl GradeCounts {
    pub fn from_grades<I>(grades: I) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        let mut counts = Self::default();
        for g in grades {
            counts.add(g);
        }
        counts
    }

    pub fn add(&mut self, grade: u8) {
        match grade {
            5 => self.count5 += 1,
            4 => self.count4 += 1,
            3 => self.count3 += 1,
            _ => {}
        }
        self.total += 1;
    }

    /// Folds another multiset of grades into this one.
    pub fn absorb(&mut self, other: &GradeCounts) {
        self.count5 += other.count5;
        self.count4 += other.count4;
        self.count3 += other.count3;
        self.total += other.total;
    }

    /// Count for one of the reported grades (5, 4 or 3); 0 for anything else.
    pub fn count_of(&self, grade: u8) -> usize {
        match grade {
            5 => self.count5,
            4 => self.count4,
            3 => self.count3,
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Share of parsed grades that are 4 or 5, in percent.
    pub fn quality(&self) -> f64 {
        Self::pct(self.count5 + self.count4, self.total)
    }

    /// Share of parsed grades that are 3, 4 or 5, in percent.
    pub fn performance(&self) -> f64 {
        Self::pct(self.count5 + self.count4 + self.count3, self.total)
    }

    /// `part / total * 100` rounded to 2 decimals; 0 when `total` is 0.
    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            round2((part as f64 / total as f64) * 100.0)
        }
    }
}

/// Rounds to 2 decimal places, ties to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Counts plus the derived percentages, as reported and serialized.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct QuarterStats {
    pub count5: usize,
    pub count4: usize,
    pub count3: usize,
    pub total: usize,
    pub quality: f64,
    pub performance: f64,
}

impl From<GradeCounts> for QuarterStats {
    fn from(c: GradeCounts) -> Self {
        QuarterStats {
            count5: c.count5,
            count4: c.count4,
            count3: c.count3,
            total: c.total,
            quality: c.quality(),
            performance: c.performance(),
        }
    }
}

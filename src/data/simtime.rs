use crate::error::*;

/// Simulation time in units of the trace's [`Timescale`].
pub type Time = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimTimeUnit {
    Fs, Ps, Ns, Us, Ms, S,
}

impl SimTimeUnit {
    pub fn from_string(s: impl AsRef<str>) -> Result<Self> {
        let s = s.as_ref();

        match s {
            "s"  => Ok(Self::S ),
            "ms" => Ok(Self::Ms),
            "us" => Ok(Self::Us),
            "ns" => Ok(Self::Ns),
            "ps" => Ok(Self::Ps),
            "fs" => Ok(Self::Fs),
            _    => Err(Error::InvalidTimescale(s.to_string()))
        }
    }

    fn to_multiplier(&self) -> u64 {
        use SimTimeUnit::*;
        match self {
            S  => 1_000_000_000_000_000,
            Ms =>     1_000_000_000_000,
            Us =>         1_000_000_000,
            Ns =>             1_000_000,
            Ps =>                 1_000,
            Fs =>                     1
        }
    }
}

impl std::fmt::Display for SimTimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::S  => "s",
            Self::Ms => "ms",
            Self::Us => "us",
            Self::Ns => "ns",
            Self::Ps => "ps",
            Self::Fs => "fs",
        };
        write!(f, "{}", s)
    }
}

/// Scale factor attached to a whole trace: one [`Time`] step corresponds to
/// `factor` times `unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timescale {
    pub factor: u32,
    pub unit: SimTimeUnit,
}

impl Timescale {
    pub const fn new(factor: u32, unit: SimTimeUnit) -> Self {
        Self { factor, unit }
    }

    /// Parse forms like `1ns`, `10 ps` or `100`+`fs` as found in dump headers.
    pub fn from_string(s: impl AsRef<str>) -> Result<Self> {
        let s = s.as_ref().trim();
        let split = s.find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| Error::InvalidTimescale(s.to_string()))?;
        let (num, unit) = s.split_at(split);
        let factor = num.parse()
            .map_err(|_| Error::InvalidTimescale(s.to_string()))?;
        let unit = SimTimeUnit::from_string(unit.trim())?;

        Ok(Self { factor, unit })
    }

    /// Absolute size of one time step in femtoseconds.
    pub fn femtos(&self) -> u64 {
        self.factor as u64 * self.unit.to_multiplier()
    }
}

impl Default for Timescale {
    fn default() -> Self {
        Self::new(1, SimTimeUnit::Ns)
    }
}

impl std::fmt::Display for Timescale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.factor, self.unit)
    }
}

/// Earliest and latest recorded time of a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange(pub Time, pub Time);

impl TimeRange {
    pub fn start(&self) -> Time {
        self.0
    }

    pub fn end(&self) -> Time {
        self.1
    }

    pub fn extend_to(&mut self, t: Time) {
        if t < self.0 {
            self.0 = t;
        }
        if t > self.1 {
            self.1 = t;
        }
    }
}

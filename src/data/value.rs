use rug::Integer;

/// One multi-valued logic bit.
///
/// Covers the canonical four states plus the VHDL-style extensions that
/// simulators emit into their dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bit {
    Zero,
    One,
    X,
    Z,
    U,
    W,
    L,
    H,
    Dash,
}

impl Bit {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Self::Zero),
            '1' => Some(Self::One),
            'x' | 'X' => Some(Self::X),
            'z' | 'Z' => Some(Self::Z),
            'u' | 'U' => Some(Self::U),
            'w' | 'W' => Some(Self::W),
            'l' | 'L' => Some(Self::L),
            'h' | 'H' => Some(Self::H),
            '-' => Some(Self::Dash),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Self::Zero => '0',
            Self::One => '1',
            Self::X => 'x',
            Self::Z => 'z',
            Self::U => 'u',
            Self::W => 'w',
            Self::L => 'l',
            Self::H => 'h',
            Self::Dash => '-',
        }
    }

    /// True for the two defined states that carry a numeric weight.
    pub fn is_defined(self) -> bool {
        matches!(self, Self::Zero | Self::One)
    }
}

/// The value of a signal at one point in time.
///
/// Scalars carry a single [`Bit`]; vectors an MSB-first bit sequence of the
/// signal's declared width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bit(Bit),
    Vector(Vec<Bit>),
}

impl Value {
    /// The all-X value of the given width, used for any query before a
    /// signal's first recorded event.
    pub fn unknown(width: u32) -> Self {
        if width <= 1 {
            Self::Bit(Bit::X)
        } else {
            Self::Vector(vec![Bit::X; width as usize])
        }
    }

    pub fn width(&self) -> u32 {
        match self {
            Self::Bit(_) => 1,
            Self::Vector(bits) => bits.len() as u32,
        }
    }

    pub fn is_fully_defined(&self) -> bool {
        match self {
            Self::Bit(b) => b.is_defined(),
            Self::Vector(bits) => bits.iter().all(|b| b.is_defined()),
        }
    }

    /// Interpret the bits as a big-endian unsigned binary number.
    ///
    /// Returns `None` if any bit is not 0 or 1; callers must check before
    /// relying on a numeric reading.
    pub fn to_integer(&self) -> Option<Integer> {
        let bits: &[Bit] = match self {
            Self::Bit(b) => std::slice::from_ref(b),
            Self::Vector(bits) => bits,
        };

        let mut rv = Integer::new();
        for (i, bit) in bits.iter().enumerate() {
            match bit {
                Bit::One => {
                    rv.set_bit((bits.len() - 1 - i) as u32, true);
                }
                Bit::Zero => {}
                _ => return None,
            }
        }

        Some(rv)
    }

    /// Normalize a decoded value to the declared width of its node.
    ///
    /// Short vectors are left-extended the way VCD prescribes: with zero
    /// when the leading bit is 0 or 1, otherwise by replicating the leading
    /// bit. Over-long vectors keep their least significant `width` bits.
    pub fn normalize(self, width: u32) -> Self {
        let bits = match self {
            Self::Bit(b) if width <= 1 => return Self::Bit(b),
            Self::Bit(b) => vec![b],
            Self::Vector(bits) if width <= 1 => {
                return Self::Bit(bits.last().copied().unwrap_or(Bit::X));
            }
            Self::Vector(bits) => bits,
        };

        let width = width as usize;
        let mut rv = Vec::with_capacity(width);

        if bits.len() < width {
            let lead = bits.first().copied().unwrap_or(Bit::X);
            let fill = match lead {
                Bit::Zero | Bit::One => Bit::Zero,
                other => other,
            };
            rv.resize(width - bits.len(), fill);
            rv.extend_from_slice(&bits);
        } else {
            rv.extend_from_slice(&bits[bits.len() - width..]);
        }

        Self::Vector(rv)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bit(b) => write!(f, "{}", b.to_char()),
            Self::Vector(bits) => {
                for b in bits {
                    write!(f, "{}", b.to_char())?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn bits(s: &str) -> Value {
        Value::Vector(s.chars().map(|c| Bit::from_char(c).unwrap()).collect())
    }

    #[test]
    fn test_bit_chars() {
        for c in "01xzuwlh-".chars() {
            assert_eq!(c, Bit::from_char(c).unwrap().to_char());
        }
        assert_eq!(Some(Bit::X), Bit::from_char('X'));
        assert_eq!(None, Bit::from_char('b'));
    }

    #[test]
    fn test_to_integer() {
        assert_eq!(Some(Integer::from(5)), bits("00000101").to_integer());
        assert_eq!(Some(Integer::from(1)), Value::Bit(Bit::One).to_integer());
        assert_eq!(Some(Integer::from(0)), bits("0000").to_integer());
        assert_eq!(None, bits("0x01").to_integer());
        assert_eq!(None, Value::Bit(Bit::Z).to_integer());
    }

    #[test]
    fn test_unknown() {
        assert_eq!(Value::Bit(Bit::X), Value::unknown(1));
        assert_eq!(bits("xxxx"), Value::unknown(4));
        assert!(!Value::unknown(8).is_fully_defined());
        assert_eq!(8, Value::unknown(8).width());
    }

    #[test]
    fn test_normalize_extension() {
        // defined leading bit extends with zero
        assert_eq!(bits("00000101"), bits("101").normalize(8));
        // x and z replicate
        assert_eq!(bits("xxxx"), bits("x").normalize(4));
        assert_eq!(bits("zzz1"), bits("z1").normalize(4));
        // too long keeps the low bits
        assert_eq!(bits("0101"), bits("110101").normalize(4));
        // vector of one collapses to a scalar
        assert_eq!(Value::Bit(Bit::One), bits("1").normalize(1));
    }

    #[test]
    fn test_display() {
        assert_eq!("1", Value::Bit(Bit::One).to_string());
        assert_eq!("10xz", bits("10xz").to_string());
    }
}

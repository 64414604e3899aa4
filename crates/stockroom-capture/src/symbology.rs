//! # Symbologies
//!
//! Barcode formats the decoder is bound to, with the text-level checks a
//! source that only sees decoded text (such as a keyboard wedge) can apply.
//!
//! ```text
//! ┌───────────────┬──────────────────────────────────────────────┐
//! │ EAN-13        │ 13 digits, GS1 check digit                   │
//! │ EAN-8         │ 8 digits, GS1 check digit                    │
//! │ UPC-A         │ 12 digits, GS1 check digit                   │
//! │ UPC-E         │ 6 digits, or 8 with number system 0/1        │
//! │ CODE-128      │ printable ASCII                              │
//! │ CODE-39/93    │ A-Z 0-9 and - . space $ / + %                │
//! │ ITF           │ even count of digits                         │
//! │ QR/DataMatrix │ any non-empty text                           │
//! └───────────────┴──────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A barcode encoding standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbology {
    #[serde(rename = "ean-13", alias = "ean13")]
    Ean13,
    #[serde(rename = "ean-8", alias = "ean8")]
    Ean8,
    #[serde(rename = "upc-a", alias = "upca")]
    UpcA,
    #[serde(rename = "upc-e", alias = "upce")]
    UpcE,
    #[serde(rename = "code-128", alias = "code128")]
    Code128,
    #[serde(rename = "code-39", alias = "code39")]
    Code39,
    #[serde(rename = "code-93", alias = "code93")]
    Code93,
    #[serde(rename = "itf")]
    Itf,
    #[serde(rename = "qr-code", alias = "qr")]
    QrCode,
    #[serde(rename = "data-matrix", alias = "datamatrix")]
    DataMatrix,
}

const CODE39_EXTRA: &str = "-. $/+%";

impl Symbology {
    /// Every supported symbology, linear formats first.
    pub const ALL: [Symbology; 10] = [
        Symbology::Ean13,
        Symbology::Ean8,
        Symbology::UpcA,
        Symbology::UpcE,
        Symbology::Code128,
        Symbology::Code39,
        Symbology::Code93,
        Symbology::Itf,
        Symbology::QrCode,
        Symbology::DataMatrix,
    ];

    /// Whether `text` is a plausible payload for this format.
    ///
    /// ```rust
    /// use stockroom_capture::Symbology;
    ///
    /// assert!(Symbology::Ean13.accepts("0123456789128"));
    /// assert!(!Symbology::Ean13.accepts("0123456789120"));
    /// ```
    pub fn accepts(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }

        match self {
            Symbology::Ean13 => text.len() == 13 && all_digits(text) && gs1_check_digit_ok(text),
            Symbology::Ean8 => text.len() == 8 && all_digits(text) && gs1_check_digit_ok(text),
            Symbology::UpcA => text.len() == 12 && all_digits(text) && gs1_check_digit_ok(text),
            Symbology::UpcE => {
                all_digits(text)
                    && (text.len() == 6
                        || (text.len() == 8 && matches!(text.as_bytes()[0], b'0' | b'1')))
            }
            Symbology::Code128 => text.len() <= 80 && text.bytes().all(|b| (32..127).contains(&b)),
            Symbology::Code39 | Symbology::Code93 => text
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || CODE39_EXTRA.contains(c)),
            Symbology::Itf => text.len() % 2 == 0 && all_digits(text),
            Symbology::QrCode => text.len() <= 4296,
            Symbology::DataMatrix => text.len() <= 2335,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Symbology::Ean13 => "ean-13",
            Symbology::Ean8 => "ean-8",
            Symbology::UpcA => "upc-a",
            Symbology::UpcE => "upc-e",
            Symbology::Code128 => "code-128",
            Symbology::Code39 => "code-39",
            Symbology::Code93 => "code-93",
            Symbology::Itf => "itf",
            Symbology::QrCode => "qr-code",
            Symbology::DataMatrix => "data-matrix",
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Symbology {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "ean13" => Ok(Symbology::Ean13),
            "ean8" => Ok(Symbology::Ean8),
            "upca" => Ok(Symbology::UpcA),
            "upce" => Ok(Symbology::UpcE),
            "code128" => Ok(Symbology::Code128),
            "code39" => Ok(Symbology::Code39),
            "code93" => Ok(Symbology::Code93),
            "itf" => Ok(Symbology::Itf),
            "qr" | "qrcode" => Ok(Symbology::QrCode),
            "datamatrix" => Ok(Symbology::DataMatrix),
            _ => Err(format!("unknown symbology: {s}")),
        }
    }
}

fn all_digits(text: &str) -> bool {
    text.bytes().all(|b| b.is_ascii_digit())
}

/// GS1 mod-10: weights 3,1,3,… from the digit left of the check digit.
fn gs1_check_digit_ok(text: &str) -> bool {
    let digits: Vec<u32> = text.bytes().map(|b| u32::from(b - b'0')).collect();
    let Some((&check, body)) = digits.split_last() else {
        return false;
    };

    let sum: u32 = body
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { d * 3 } else { *d })
        .sum();

    (10 - sum % 10) % 10 == check
}

//! Accounts, assets and amounts.
//!
//! Amounts are either native drops or issued values tied to a currency and
//! an issuer. Issued values are kept in normalized mantissa/exponent form so
//! that equal quantities written differently ("13.1", "13.10", "1.31e1")
//! compare, store and encode identically.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Code of the chain's native asset.
pub const NATIVE_CURRENCY: &str = "XRP";

const MAX_ACCOUNT_LEN: usize = 128;
const MIN_MANTISSA: u64 = 1_000_000_000_000_000;
const MAX_MANTISSA: u64 = 9_999_999_999_999_999;
const MIN_EXPONENT: i32 = -96;
const MAX_EXPONENT: i32 = 80;
const SIGNIFICANT_DIGITS: usize = 16;

/// Opaque account identifier on either chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(CoreError::field("account", "must not be empty"));
        }
        if value.len() > MAX_ACCOUNT_LEN {
            return Err(CoreError::field(
                "account",
                format!("longer than {} bytes", MAX_ACCOUNT_LEN),
            ));
        }
        if !value.chars().all(|c| c.is_ascii_graphic()) {
            return Err(CoreError::field(
                "account",
                format!("'{}' contains whitespace or non-ascii characters", value),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccountId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<AccountId> for String {
    fn from(account: AccountId) -> Self {
        account.0
    }
}

impl FromStr for AccountId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Currency code of an issued asset: a three character code or a
/// 40 digit hex code (stored upper case).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        if code.len() == 40 && code.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(Self(code.to_ascii_uppercase()));
        }
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::field(
                "currency",
                format!("'{}' is neither a 3 character nor a 40 hex digit code", code),
            ));
        }
        if code == NATIVE_CURRENCY {
            return Err(CoreError::field(
                "currency",
                "the native currency cannot be issued",
            ));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Currency {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Asset identity on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "IssueRepr", into = "IssueRepr")]
pub enum Issue {
    /// The chain's native asset
    Native,
    /// An asset issued by an account
    Issued { currency: Currency, issuer: AccountId },
}

impl Issue {
    pub fn is_native(&self) -> bool {
        matches!(self, Issue::Native)
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::Native => f.write_str(NATIVE_CURRENCY),
            Issue::Issued { currency, issuer } => write!(f, "{}/{}", currency, issuer),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum IssueRepr {
    Native(String),
    Issued { currency: String, issuer: String },
}

impl TryFrom<IssueRepr> for Issue {
    type Error = CoreError;

    fn try_from(repr: IssueRepr) -> Result<Self> {
        match repr {
            IssueRepr::Native(code) if code == NATIVE_CURRENCY => Ok(Issue::Native),
            IssueRepr::Native(code) => Err(CoreError::field(
                "issue",
                format!("'{}' is not the native currency; issued assets need an issuer", code),
            )),
            IssueRepr::Issued { currency, issuer } => Ok(Issue::Issued {
                currency: Currency::new(currency)?,
                issuer: AccountId::new(issuer)?,
            }),
        }
    }
}

impl From<Issue> for IssueRepr {
    fn from(issue: Issue) -> Self {
        match issue {
            Issue::Native => IssueRepr::Native(NATIVE_CURRENCY.to_string()),
            Issue::Issued { currency, issuer } => IssueRepr::Issued {
                currency: currency.into(),
                issuer: issuer.into(),
            },
        }
    }
}

/// Normalized decimal value of an issued amount: `mantissa * 10^exponent`
/// with `|mantissa|` in `[10^15, 10^16)`, or zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IouValue {
    mantissa: i64,
    exponent: i32,
}

impl IouValue {
    pub const ZERO: IouValue = IouValue {
        mantissa: 0,
        exponent: 0,
    };

    /// Build a value from an unnormalized mantissa and exponent.
    pub fn new(negative: bool, mut mantissa: u64, mut exponent: i32) -> Result<Self> {
        if mantissa == 0 {
            return Ok(Self::ZERO);
        }
        while mantissa < MIN_MANTISSA {
            mantissa *= 10;
            exponent = exponent.saturating_sub(1);
        }
        while mantissa > MAX_MANTISSA {
            if mantissa % 10 != 0 {
                return Err(CoreError::InvalidAmount(format!(
                    "more than {} significant digits",
                    SIGNIFICANT_DIGITS
                )));
            }
            mantissa /= 10;
            exponent = exponent.saturating_add(1);
        }
        if !(MIN_EXPONENT..=MAX_EXPONENT).contains(&exponent) {
            return Err(CoreError::InvalidAmount(format!(
                "exponent {} out of range",
                exponent
            )));
        }
        let mantissa = mantissa as i64;
        Ok(Self {
            mantissa: if negative { -mantissa } else { mantissa },
            exponent,
        })
    }

    pub fn mantissa(&self) -> i64 {
        self.mantissa
    }

    pub fn exponent(&self) -> i32 {
        self.exponent
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa == 0
    }

    pub fn is_negative(&self) -> bool {
        self.mantissa < 0
    }
}

impl FromStr for IouValue {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CoreError::InvalidAmount(format!("'{}' is not a decimal value", s));

        let (negative, body) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (number, exp) = match body.find(|c| c == 'e' || c == 'E') {
            Some(pos) => (
                &body[..pos],
                body[pos + 1..].parse::<i32>().map_err(|_| invalid())?,
            ),
            None => (body, 0),
        };
        let (int_part, frac_part) = match number.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (number, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let digits: String = int_part.chars().chain(frac_part.chars()).collect();
        let digits = digits.trim_start_matches('0');
        let trimmed = digits.trim_end_matches('0');
        if trimmed.is_empty() {
            return Ok(Self::ZERO);
        }
        if trimmed.len() > SIGNIFICANT_DIGITS {
            return Err(CoreError::InvalidAmount(format!(
                "'{}' has more than {} significant digits",
                s, SIGNIFICANT_DIGITS
            )));
        }
        let dropped = (digits.len() - trimmed.len()) as i32;
        let mantissa = trimmed.parse::<u64>().map_err(|_| invalid())?;
        let exponent = exp
            .checked_sub(frac_part.len() as i32)
            .and_then(|e| e.checked_add(dropped))
            .ok_or_else(invalid)?;
        Self::new(negative, mantissa, exponent)
    }
}

impl fmt::Display for IouValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mantissa == 0 {
            return f.write_str("0");
        }
        let mut mantissa = self.mantissa.unsigned_abs();
        let mut exponent = self.exponent;
        while mantissa % 10 == 0 {
            mantissa /= 10;
            exponent += 1;
        }
        if self.mantissa < 0 {
            f.write_str("-")?;
        }
        let digits = mantissa.to_string();
        if !(-25..=10).contains(&exponent) {
            return write!(f, "{}e{}", digits, exponent);
        }
        if exponent >= 0 {
            return write!(f, "{}{}", digits, "0".repeat(exponent as usize));
        }
        let scale = exponent.unsigned_abs() as usize;
        if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            write!(f, "{}.{}", int_part, frac_part)
        } else {
            write!(f, "0.{}{}", "0".repeat(scale - digits.len()), digits)
        }
    }
}

impl TryFrom<String> for IouValue {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<IouValue> for String {
    fn from(value: IouValue) -> Self {
        value.to_string()
    }
}

/// A typed amount, aware of currency and issuer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "AmountRepr", into = "AmountRepr")]
pub enum Amount {
    /// Native asset, in drops
    Native { drops: u64 },
    /// Issued asset
    Issued {
        value: IouValue,
        currency: Currency,
        issuer: AccountId,
    },
}

impl Amount {
    pub fn native(drops: u64) -> Self {
        Amount::Native { drops }
    }

    pub fn issued(value: &str, currency: &str, issuer: &str) -> Result<Self> {
        Ok(Amount::Issued {
            value: value.parse()?,
            currency: Currency::new(currency)?,
            issuer: AccountId::new(issuer)?,
        })
    }

    /// The asset this amount is denominated in.
    pub fn issue(&self) -> Issue {
        match self {
            Amount::Native { .. } => Issue::Native,
            Amount::Issued {
                currency, issuer, ..
            } => Issue::Issued {
                currency: currency.clone(),
                issuer: issuer.clone(),
            },
        }
    }
}

/// Compact text form: `"<drops>"` for native amounts and
/// `"<value>/<currency>/<issuer>"` for issued ones.
impl FromStr for Amount {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            [drops] => drops
                .parse::<u64>()
                .map(Amount::native)
                .map_err(|_| CoreError::InvalidAmount(format!("'{}' is not a drop count", s))),
            [value, currency, issuer] => Amount::issued(value, currency, issuer),
            _ => Err(CoreError::InvalidAmount(format!(
                "'{}' is neither <drops> nor <value>/<currency>/<issuer>",
                s
            ))),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Native { drops } => write!(f, "{}", drops),
            Amount::Issued {
                value,
                currency,
                issuer,
            } => write!(f, "{}/{}/{}", value, currency, issuer),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Native(String),
    Issued {
        currency: String,
        issuer: String,
        value: String,
    },
}

impl TryFrom<AmountRepr> for Amount {
    type Error = CoreError;

    fn try_from(repr: AmountRepr) -> Result<Self> {
        match repr {
            AmountRepr::Native(drops) => drops
                .parse::<u64>()
                .map(Amount::native)
                .map_err(|_| CoreError::InvalidAmount(format!("'{}' is not a drop count", drops))),
            AmountRepr::Issued {
                currency,
                issuer,
                value,
            } => Amount::issued(&value, &currency, &issuer),
        }
    }
}

impl From<Amount> for AmountRepr {
    fn from(amount: Amount) -> Self {
        match amount {
            Amount::Native { drops } => AmountRepr::Native(drops.to_string()),
            Amount::Issued {
                value,
                currency,
                issuer,
            } => AmountRepr::Issued {
                currency: currency.into(),
                issuer: issuer.into(),
                value: value.into(),
            },
        }
    }
}

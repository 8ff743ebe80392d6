// 🪙 Token - one unit of currency or investment
//
// A token is a value: (owner, creation date, kind, sequence). It is never
// mutated, only moved between containers. The textual form exists only at
// serialization boundaries:
//
//   <YYYY-MM-DD>-<owner_id>-<tag><sequence>
//   2010-04-18-alice-guzi0003   (currency)
//   2010-04-18-alice-guza0003   (investment)
//
// The date is always the first 10 characters and the kind tag always follows
// the last '-', so owner ids may themselves contain '-'.

use crate::error::{LedgerError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const DATE_LEN: usize = 10;
const TAG_LEN: usize = 4;
const SEQUENCE_WIDTH: usize = 4;

// ============================================================================
// ACCOUNT ID
// ============================================================================

/// Identifier of an account. Caller-assigned; uniqueness is enforced by the
/// [`crate::Ledger`] that holds the accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        AccountId(id.into())
    }

    /// Fresh random id for accounts nobody needs to address by name
    pub fn generate() -> Self {
        AccountId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        AccountId(id.to_string())
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        AccountId(id)
    }
}

// ============================================================================
// TOKEN KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TokenKind {
    /// Spendable unit
    Currency,

    /// Unit meant for contribution to a pooled account
    Investment,
}

impl TokenKind {
    pub fn tag(&self) -> &'static str {
        match self {
            TokenKind::Currency => "guzi",
            TokenKind::Investment => "guza",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "guzi" => Some(TokenKind::Currency),
            "guza" => Some(TokenKind::Investment),
            _ => None,
        }
    }
}

// ============================================================================
// TOKEN
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token {
    owner: AccountId,
    created_on: NaiveDate,
    kind: TokenKind,
    sequence: u32,
}

impl Token {
    pub fn new(owner: AccountId, created_on: NaiveDate, kind: TokenKind, sequence: u32) -> Self {
        Token {
            owner,
            created_on,
            kind,
            sequence,
        }
    }

    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    pub fn created_on(&self) -> NaiveDate {
        self.created_on
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn is_currency(&self) -> bool {
        self.kind == TokenKind::Currency
    }

    /// Whole days elapsed between creation and `today` (negative if `today`
    /// is earlier than the creation date)
    pub fn age_in_days(&self, today: NaiveDate) -> i64 {
        (today - self.created_on).num_days()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}{:0width$}",
            self.created_on.format("%Y-%m-%d"),
            self.owner,
            self.kind.tag(),
            self.sequence,
            width = SEQUENCE_WIDTH
        )
    }
}

impl FromStr for Token {
    type Err = LedgerError;

    fn from_str(text: &str) -> Result<Self> {
        parse(text)
    }
}

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Token {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// TEXTUAL ENCODING
// ============================================================================

/// Canonical text for the tuple (account, date, kind, sequence)
pub fn encode(account_id: &AccountId, date: NaiveDate, kind: TokenKind, sequence: u32) -> String {
    Token::new(account_id.clone(), date, kind, sequence).to_string()
}

/// Kind of the token encoded in `text`, read from its suffix
pub fn kind_of(text: &str) -> Result<TokenKind> {
    let (_, suffix) = split_suffix(text)?;
    let (kind, _) = parse_suffix(text, suffix)?;
    Ok(kind)
}

/// Creation date of the token encoded in `text`, read from its leading date
pub fn created_on(text: &str) -> Result<NaiveDate> {
    let head = text
        .get(..DATE_LEN)
        .ok_or_else(|| malformed(text))?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").map_err(|_| malformed(text))
}

/// Full identity recovered from token text
pub fn parse(text: &str) -> Result<Token> {
    let created_on = created_on(text)?;
    let (head, suffix) = split_suffix(text)?;
    let (kind, sequence) = parse_suffix(text, suffix)?;

    // head is "<date>-<owner>"
    if head.len() < DATE_LEN + 1 || head.as_bytes()[DATE_LEN] != b'-' {
        return Err(malformed(text));
    }
    let owner = head.get(DATE_LEN + 1..).ok_or_else(|| malformed(text))?;

    Ok(Token::new(AccountId::from(owner), created_on, kind, sequence))
}

fn split_suffix(text: &str) -> Result<(&str, &str)> {
    text.rsplit_once('-').ok_or_else(|| malformed(text))
}

fn parse_suffix(text: &str, suffix: &str) -> Result<(TokenKind, u32)> {
    let tag = suffix.get(..TAG_LEN).ok_or_else(|| malformed(text))?;
    let digits = suffix.get(TAG_LEN..).ok_or_else(|| malformed(text))?;

    let kind = TokenKind::from_tag(tag).ok_or_else(|| malformed(text))?;
    if digits.len() < SEQUENCE_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed(text));
    }
    let sequence = digits.parse().map_err(|_| malformed(text))?;

    Ok((kind, sequence))
}

fn malformed(text: &str) -> LedgerError {
    LedgerError::MalformedToken(text.to_string())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_encode_format() {
        let id = AccountId::from("id");
        assert_eq!(
            encode(&id, date(2000, 1, 1), TokenKind::Currency, 0),
            "2000-01-01-id-guzi0000"
        );
        assert_eq!(
            encode(&id, date(2000, 1, 1), TokenKind::Investment, 342),
            "2000-01-01-id-guza0342"
        );
    }

    #[test]
    fn test_kind_of() {
        assert_eq!(kind_of("2010-04-18-alice-guzi0001").unwrap(), TokenKind::Currency);
        assert_eq!(kind_of("2010-04-18-alice-guza0001").unwrap(), TokenKind::Investment);
        assert!(matches!(
            kind_of("2010-04-18-alice-gold0001"),
            Err(LedgerError::MalformedToken(_))
        ));
        assert!(kind_of("no separators").is_err());
        assert!(kind_of("2010-04-18-alice-guzi01").is_err());
    }

    #[test]
    fn test_created_on() {
        assert_eq!(created_on("2010-04-18-alice-guzi0001").unwrap(), date(2010, 4, 18));
        assert!(matches!(
            created_on("2010-02-30-alice-guzi0001"),
            Err(LedgerError::MalformedToken(_))
        ));
        assert!(created_on("2010").is_err());
    }

    #[test]
    fn test_parse_owner_with_dashes() {
        let token = parse("2024-02-29-a1b2-c3d4-guza0012").unwrap();
        assert_eq!(token.owner().as_str(), "a1b2-c3d4");
        assert_eq!(token.created_on(), date(2024, 2, 29));
        assert_eq!(token.kind(), TokenKind::Investment);
        assert_eq!(token.sequence(), 12);
    }

    #[test]
    fn test_parse_empty_owner() {
        let token = parse("2010-02-01--guzi0000").unwrap();
        assert_eq!(token.owner().as_str(), "");
        assert_eq!(token.to_string(), "2010-02-01--guzi0000");
    }

    #[test]
    fn test_parse_rejects_missing_owner_separator() {
        assert!(parse("2010-02-01Xalice-guzi0000").is_err());
    }

    #[test]
    fn test_wide_sequence_survives_text_form() {
        let token = Token::new(AccountId::from("big"), date(2030, 6, 1), TokenKind::Currency, 12345);
        assert_eq!(token.to_string(), "2030-06-01-big-guzi12345");
        assert_eq!(parse(&token.to_string()).unwrap(), token);
    }

    #[test]
    fn test_serde_uses_text_form() {
        let token = Token::new(AccountId::from("bob"), date(2012, 3, 18), TokenKind::Currency, 2);
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, "\"2012-03-18-bob-guzi0002\"");

        let back: Token = serde_json::from_str(&json).unwrap();
        assert_eq!(back, token);

        assert!(serde_json::from_str::<Token>("\"garbage\"").is_err());
    }

    #[test]
    fn test_age_in_days() {
        let token = Token::new(AccountId::from("a"), date(2010, 1, 1), TokenKind::Currency, 0);
        assert_eq!(token.age_in_days(date(2010, 1, 31)), 30);
        assert_eq!(token.age_in_days(date(2010, 1, 1)), 0);
    }
}

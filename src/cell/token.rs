//! Compact hexadecimal tokens for cell ids.
//!
//! A token is the id as 16 lowercase hex digits with trailing zeros removed.
//! Coarser cells have more trailing zeros and therefore shorter tokens.

use super::CellId;
use crate::error::{GeoCellError, Result};
use std::fmt;
use std::str::FromStr;

const MAX_TOKEN_LEN: usize = 16;

impl CellId {
    /// ```
    /// use geocell::CellId;
    ///
    /// assert_eq!(CellId::from_face(0)?.to_token(), "1");
    /// assert_eq!(CellId::from_lat_lon(0.0, 0.0, 30)?.to_token(), "1000000000000001");
    /// # Ok::<(), geocell::GeoCellError>(())
    /// ```
    pub fn to_token(self) -> String {
        let hex = format!("{:016x}", self.raw());
        hex.trim_end_matches('0').to_string()
    }

    /// Parse a token; upper- and lowercase hex are both accepted.
    pub fn from_token(token: &str) -> Result<CellId> {
        if token.is_empty() {
            return Err(GeoCellError::invalid_format("token", "token is empty"));
        }
        if token.len() > MAX_TOKEN_LEN {
            return Err(GeoCellError::invalid_format(
                "token",
                format!(
                    "{:?} has {} characters, at most {} allowed",
                    token,
                    token.len(),
                    MAX_TOKEN_LEN
                ),
            ));
        }
        if let Some(c) = token.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(GeoCellError::invalid_format(
                "token",
                format!("non-hex character {:?} in {:?}", c, token),
            ));
        }

        let padded = format!("{:0<width$}", token, width = MAX_TOKEN_LEN);
        let raw = u64::from_str_radix(&padded, 16)
            .map_err(|e| GeoCellError::invalid_format("token", e.to_string()))?;
        CellId::new(raw).map_err(|_| {
            GeoCellError::invalid_format("token", format!("{:?} does not name a cell", token))
        })
    }
}

pub fn cell_id_to_token(cell: CellId) -> String {
    cell.to_token()
}

pub fn token_to_cell_id(token: &str) -> Result<CellId> {
    CellId::from_token(token)
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_token())
    }
}

impl FromStr for CellId {
    type Err = GeoCellError;

    fn from_str(s: &str) -> Result<Self> {
        CellId::from_token(s)
    }
}

impl From<CellId> for String {
    fn from(cell: CellId) -> Self {
        cell.to_token()
    }
}

impl TryFrom<String> for CellId {
    type Error = GeoCellError;

    fn try_from(token: String) -> Result<Self> {
        CellId::from_token(&token)
    }
}

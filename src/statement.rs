use crate::error::PrepareError;
use crate::row::{Row, COLUMN_EMAIL_SIZE, COLUMN_USERNAME_SIZE};

/// One parsed, not-yet-executed statement. `Insert` carries its fully
/// validated row so execution never has to re-check field lengths.
pub enum Statement {
    Insert(Row),
    Select,
}

pub fn prepare_statement(input: &str) -> Result<Statement, PrepareError> {
    if input.starts_with("insert") {
        prepare_insert(input)
    } else if input == "select" {
        Ok(Statement::Select)
    } else {
        Err(PrepareError::UnrecognizedStatement(input.to_string()))
    }
}

/// Parses `insert <id> <username> <email>`, mirroring the original
/// tutorial's hand-rolled `sscanf`-style split rather than reaching for a
/// parser combinator — there are exactly three fields and no quoting.
fn prepare_insert(input: &str) -> Result<Statement, PrepareError> {
    let mut parts = input.split_whitespace();
    parts.next(); // "insert"

    let id_str = parts.next().ok_or(PrepareError::SyntaxError)?;
    let username = parts.next().ok_or(PrepareError::SyntaxError)?;
    let email = parts.next().ok_or(PrepareError::SyntaxError)?;
    if parts.next().is_some() {
        return Err(PrepareError::SyntaxError);
    }

    // Parsed directly as u32 so anything that doesn't fit in 32 bits is
    // rejected rather than silently wrapped; a leading '-' gets the more
    // specific message instead of a bare syntax error.
    let id: u32 = id_str.parse().map_err(|_| {
        if id_str.starts_with('-') {
            PrepareError::NegativeId
        } else {
            PrepareError::SyntaxError
        }
    })?;

    if username.len() > COLUMN_USERNAME_SIZE || email.len() > COLUMN_EMAIL_SIZE {
        return Err(PrepareError::StringTooLong);
    }

    Ok(Statement::Insert(Row::new(id, username, email)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_insert() {
        match prepare_statement("insert 1 alice alice@example.com").unwrap() {
            Statement::Insert(row) => {
                assert_eq!(row.id, 1);
                assert_eq!(row.username, "alice");
                assert_eq!(row.email, "alice@example.com");
            }
            Statement::Select => panic!("expected Insert"),
        }
    }

    #[test]
    fn parses_select() {
        assert!(matches!(prepare_statement("select").unwrap(), Statement::Select));
    }

    #[test]
    fn rejects_negative_id() {
        let err = prepare_statement("insert -1 alice alice@example.com").unwrap_err();
        assert_eq!(err, PrepareError::NegativeId);
    }

    #[test]
    fn rejects_id_that_overflows_u32() {
        let err = prepare_statement("insert 99999999999999 alice alice@example.com").unwrap_err();
        assert_eq!(err, PrepareError::SyntaxError);
    }

    #[test]
    fn rejects_overlong_username() {
        let long = "a".repeat(COLUMN_USERNAME_SIZE + 1);
        let input = format!("insert 1 {long} alice@example.com");
        let err = prepare_statement(&input).unwrap_err();
        assert_eq!(err, PrepareError::StringTooLong);
    }

    #[test]
    fn rejects_overlong_email() {
        let long = "a".repeat(COLUMN_EMAIL_SIZE + 1);
        let input = format!("insert 1 alice {long}");
        let err = prepare_statement(&input).unwrap_err();
        assert_eq!(err, PrepareError::StringTooLong);
    }

    #[test]
    fn rejects_incomplete_insert() {
        let err = prepare_statement("insert 1 alice").unwrap_err();
        assert_eq!(err, PrepareError::SyntaxError);
    }

    #[test]
    fn rejects_unrecognized_keyword() {
        let err = prepare_statement("delete 1").unwrap_err();
        assert!(matches!(err, PrepareError::UnrecognizedStatement(_)));
    }
}

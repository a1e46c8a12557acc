use byteorder::{ByteOrder, LittleEndian};

// C strings are supposed to end with a null character, so one extra byte
// of room is reserved past the longest allowed content.
pub const COLUMN_USERNAME_SIZE: usize = 32;
pub const COLUMN_EMAIL_SIZE: usize = 255;

const ID_SIZE: usize = 4;
const USERNAME_SIZE: usize = COLUMN_USERNAME_SIZE + 1;
const EMAIL_SIZE: usize = COLUMN_EMAIL_SIZE + 1;

const ID_OFFSET: usize = 0;
const USERNAME_OFFSET: usize = ID_OFFSET + ID_SIZE;
const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_SIZE;

pub const ROW_SIZE: usize = ID_SIZE + USERNAME_SIZE + EMAIL_SIZE;

/// A single fixed-width record. `username`/`email` are validated at
/// statement-prepare time, so serialization here never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: u32,
    pub username: String,
    pub email: String,
}

impl Row {
    pub fn new(id: u32, username: impl Into<String>, email: impl Into<String>) -> Self {
        Row {
            id,
            username: username.into(),
            email: email.into(),
        }
    }

    pub fn serialize(&self, out: &mut [u8]) {
        debug_assert!(out.len() >= ROW_SIZE);
        LittleEndian::write_u32(&mut out[ID_OFFSET..ID_OFFSET + ID_SIZE], self.id);
        write_string(out, USERNAME_OFFSET, &self.username, USERNAME_SIZE);
        write_string(out, EMAIL_OFFSET, &self.email, EMAIL_SIZE);
    }

    pub fn deserialize(buf: &[u8]) -> Row {
        debug_assert!(buf.len() >= ROW_SIZE);
        let id = LittleEndian::read_u32(&buf[ID_OFFSET..ID_OFFSET + ID_SIZE]);
        let username = read_string(buf, USERNAME_OFFSET, USERNAME_SIZE);
        let email = read_string(buf, EMAIL_OFFSET, EMAIL_SIZE);
        Row { id, username, email }
    }
}

fn write_string(buf: &mut [u8], pos: usize, s: &str, field_len: usize) {
    let bytes = s.as_bytes();
    buf[pos..pos + bytes.len()].copy_from_slice(bytes);
    for b in &mut buf[pos + bytes.len()..pos + field_len] {
        *b = 0;
    }
}

fn read_string(buf: &[u8], pos: usize, field_len: usize) -> String {
    let field = &buf[pos..pos + field_len];
    let end = field.iter().position(|&b| b == 0).unwrap_or(field_len);
    String::from_utf8_lossy(&field[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_ascii_fields() {
        let row = Row::new(7, "alice", "alice@example.com");
        let mut buf = [0u8; ROW_SIZE];
        row.serialize(&mut buf);
        assert_eq!(Row::deserialize(&buf), row);
    }

    #[test]
    fn round_trips_max_length_fields() {
        let username = "a".repeat(COLUMN_USERNAME_SIZE);
        let email = "b".repeat(COLUMN_EMAIL_SIZE);
        let row = Row::new(1, username, email);
        let mut buf = [0u8; ROW_SIZE];
        row.serialize(&mut buf);
        assert_eq!(Row::deserialize(&buf), row);
    }

    #[test]
    fn pads_short_fields_with_zero() {
        let row = Row::new(1, "a", "b");
        let mut buf = [0xffu8; ROW_SIZE];
        row.serialize(&mut buf);
        assert_eq!(buf[USERNAME_OFFSET + 1], 0);
        assert_eq!(buf[EMAIL_OFFSET + 1], 0);
    }
}

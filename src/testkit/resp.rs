//! RESP2 values as seen by the server side of a connection

/// A single RESP2 frame
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  SimpleString(String),
  Error(String),
  Integer(i64),
  /// `None` is the null bulk string
  BulkString(Option<Vec<u8>>),
  /// `None` is the null array
  Array(Option<Vec<Value>>),
}

impl Value {
  pub fn ok() -> Self {
    Value::SimpleString("OK".to_string())
  }

  pub fn error(msg: impl Into<String>) -> Self {
    Value::Error(msg.into())
  }

  pub fn bulk(data: impl AsRef<[u8]>) -> Self {
    Value::BulkString(Some(data.as_ref().to_vec()))
  }

  pub fn nil() -> Self {
    Value::BulkString(None)
  }

  /// Text of a string-like frame, used to read command names and arguments
  pub fn as_text(&self) -> Option<String> {
    match self {
      Value::BulkString(Some(data)) => Some(String::from_utf8_lossy(data).into_owned()),
      Value::SimpleString(s) => Some(s.clone()),
      _ => None,
    }
  }

  pub fn encode(&self) -> Vec<u8> {
    let mut buf = Vec::new();
    self.encode_to(&mut buf);
    buf
  }

  fn encode_to(&self, buf: &mut Vec<u8>) {
    match self {
      Value::SimpleString(s) => write_line(buf, b'+', s.as_bytes()),
      Value::Error(e) => write_line(buf, b'-', e.as_bytes()),
      Value::Integer(i) => write_line(buf, b':', i.to_string().as_bytes()),
      Value::BulkString(None) => buf.extend_from_slice(b"$-1\r\n"),
      Value::BulkString(Some(data)) => {
        write_line(buf, b'$', data.len().to_string().as_bytes());
        buf.extend_from_slice(data);
        buf.extend_from_slice(b"\r\n");
      }
      Value::Array(None) => buf.extend_from_slice(b"*-1\r\n"),
      Value::Array(Some(items)) => {
        write_line(buf, b'*', items.len().to_string().as_bytes());
        for item in items {
          item.encode_to(buf);
        }
      }
    }
  }
}

fn write_line(buf: &mut Vec<u8>, prefix: u8, body: &[u8]) {
  buf.push(prefix);
  buf.extend_from_slice(body);
  buf.extend_from_slice(b"\r\n");
}

/// Incremental RESP2 parser
pub struct Parser;

impl Parser {
  /// Parse one frame from the front of `buffer`.
  ///
  /// Returns the frame and the number of bytes it used, or `None` when the
  /// buffer does not yet hold a complete frame.
  pub fn parse(buffer: &[u8]) -> Option<(Value, usize)> {
    let mut cursor = Cursor { buf: buffer, pos: 0 };
    let value = cursor.value()?;
    Some((value, cursor.pos))
  }
}

struct Cursor<'a> {
  buf: &'a [u8],
  pos: usize,
}

impl<'a> Cursor<'a> {
  fn value(&mut self) -> Option<Value> {
    let type_byte = *self.buf.get(self.pos)?;
    self.pos += 1;

    match type_byte {
      b'+' => Some(Value::SimpleString(self.text_line()?)),
      b'-' => Some(Value::Error(self.text_line()?)),
      b':' => Some(Value::Integer(self.number()?)),
      b'$' => self.bulk_string(),
      b'*' => self.array(),
      _ => None,
    }
  }

  fn bulk_string(&mut self) -> Option<Value> {
    let len = self.number()?;
    if len == -1 {
      return Some(Value::BulkString(None));
    }
    let len = usize::try_from(len).ok()?;

    // payload plus trailing \r\n
    if self.pos + len + 2 > self.buf.len() {
      return None;
    }
    let data = self.buf[self.pos..self.pos + len].to_vec();
    self.pos += len + 2;
    Some(Value::BulkString(Some(data)))
  }

  fn array(&mut self) -> Option<Value> {
    let count = self.number()?;
    if count == -1 {
      return Some(Value::Array(None));
    }
    let count = usize::try_from(count).ok()?;

    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
      items.push(self.value()?);
    }
    Some(Value::Array(Some(items)))
  }

  fn number(&mut self) -> Option<i64> {
    self.text_line()?.parse().ok()
  }

  fn text_line(&mut self) -> Option<String> {
    let line = self.line()?;
    Some(String::from_utf8_lossy(line).into_owned())
  }

  fn line(&mut self) -> Option<&'a [u8]> {
    let buf: &'a [u8] = self.buf;
    let rest = &buf[self.pos..];
    let end = rest.windows(2).position(|w| w == b"\r\n")?;
    self.pos += end + 2;
    Some(&rest[..end])
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_hset_command() {
    let data = b"*4\r\n$4\r\nHSET\r\n$5\r\nqueue\r\n$5\r\njob_1\r\n$6\r\nqueued\r\n";
    let (value, consumed) = Parser::parse(data).unwrap();

    assert_eq!(
      value,
      Value::Array(Some(vec![
        Value::bulk("HSET"),
        Value::bulk("queue"),
        Value::bulk("job_1"),
        Value::bulk("queued"),
      ]))
    );
    assert_eq!(consumed, data.len());
  }

  #[test]
  fn test_parse_incomplete_frame() {
    assert!(Parser::parse(b"").is_none());
    assert!(Parser::parse(b"*2\r\n$4\r\nHGET\r\n").is_none());
    assert!(Parser::parse(b"$5\r\nhel").is_none());
  }

  #[test]
  fn test_parse_pipelined_frames() {
    let data = b"+OK\r\n:3\r\n";
    let (first, used) = Parser::parse(data).unwrap();
    assert_eq!(first, Value::ok());
    let (second, rest) = Parser::parse(&data[used..]).unwrap();
    assert_eq!(second, Value::Integer(3));
    assert_eq!(used + rest, data.len());
  }

  #[test]
  fn test_encode_replies() {
    assert_eq!(Value::ok().encode(), b"+OK\r\n");
    assert_eq!(Value::Integer(2).encode(), b":2\r\n");
    assert_eq!(Value::nil().encode(), b"$-1\r\n");
    assert_eq!(Value::error("NOAUTH").encode(), b"-NOAUTH\r\n");
    assert_eq!(
      Value::Array(Some(vec![Value::bulk("foo"), Value::bulk("bar")])).encode(),
      b"*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n"
    );
  }
}

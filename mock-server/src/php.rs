//! Decoder for the base64'd PHP `serialize()` arrays used by the
//! `customfields` parameter. Only flat arrays of scalars are understood.

use base64::prelude::*;

/// Decode `base64(serialize(array(id => value, ...)))` into pairs.
pub fn custom_fields(encoded: &str) -> Result<Vec<(u64, String)>, String> {
    let bytes = BASE64_STANDARD
        .decode(encoded.trim())
        .map_err(|e| format!("customfields is not base64: {e}"))?;
    let text = String::from_utf8(bytes).map_err(|e| e.to_string())?;
    let mut reader = Reader { rest: &text };
    reader.array()?
        .into_iter()
        .map(|(key, value)| {
            key.parse()
                .map(|id| (id, value))
                .map_err(|_| format!("custom field id `{key}` is not numeric"))
        })
        .collect()
}

struct Reader<'a> {
    rest: &'a str,
}

impl<'a> Reader<'a> {
    fn array(&mut self) -> Result<Vec<(String, String)>, String> {
        self.expect("a:")?;
        let len: usize = self.until(':')?.parse().map_err(|_| "bad array length")?;
        self.expect("{")?;
        let mut entries = Vec::with_capacity(len);
        for _ in 0..len {
            let key = self.scalar()?;
            let value = self.scalar()?;
            entries.push((key, value));
        }
        self.expect("}")?;
        Ok(entries)
    }

    fn scalar(&mut self) -> Result<String, String> {
        let tag = self.rest.get(..2).ok_or("truncated value")?;
        self.rest = &self.rest[2..];
        match tag {
            "s:" => {
                let len: usize = self.until(':')?.parse().map_err(|_| "bad string length")?;
                self.expect("\"")?;
                let value = self.rest.get(..len).ok_or("truncated string")?.to_string();
                self.rest = &self.rest[len..];
                self.expect("\";")?;
                Ok(value)
            }
            "i:" | "d:" | "b:" => self.until(';'),
            other => Err(format!("unsupported value tag `{other}`")),
        }
    }

    fn until(&mut self, end: char) -> Result<String, String> {
        let at = self.rest.find(end).ok_or_else(|| format!("missing `{end}`"))?;
        let value = self.rest[..at].to_string();
        self.rest = &self.rest[at + end.len_utf8()..];
        Ok(value)
    }

    fn expect(&mut self, token: &str) -> Result<(), String> {
        self.rest = self
            .rest
            .strip_prefix(token)
            .ok_or_else(|| format!("expected `{token}`"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_id_value_pairs() {
        let encoded = BASE64_STANDARD.encode("a:2:{i:1;s:6:\"Google\";i:7;s:0:\"\";}");
        assert_eq!(
            custom_fields(&encoded).unwrap(),
            vec![(1, "Google".to_string()), (7, String::new())]
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(custom_fields("not base64!").is_err());
        assert!(custom_fields(&BASE64_STANDARD.encode("s:3:\"abc\";")).is_err());
    }
}

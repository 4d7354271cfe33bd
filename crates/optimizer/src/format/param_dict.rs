//! Untyped parameter table for one topology line
//!
//! The topology format does not encode parameter types; the layer catalog
//! decides whether an id holds an int or a float. Each scalar token is
//! therefore kept in both parses and the typed getter picks one, mirroring
//! how the runtime's parameter dictionary behaves.

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy)]
struct DualScalar {
    int: i32,
    float: f32,
}

#[derive(Debug, Clone)]
enum ParamEntry {
    Scalar(DualScalar),
    Array(Vec<DualScalar>),
}

/// Parameter id → value table with typed getters.
#[derive(Debug, Clone, Default)]
pub struct ParamDict {
    entries: FxHashMap<i32, ParamEntry>,
}

fn parse_dual(token: &str) -> Result<DualScalar, String> {
    let float: f32 = token
        .parse()
        .map_err(|_| format!("invalid numeric value '{token}'"))?;
    // atoi semantics: a fractional token truncates toward zero
    let int = token.parse::<i32>().unwrap_or(float as i32);
    Ok(DualScalar { int, float })
}

impl ParamDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a scalar parameter from its wire token.
    pub fn insert_scalar(&mut self, id: i32, token: &str) -> Result<(), String> {
        let value = parse_dual(token)?;
        self.entries.insert(id, ParamEntry::Scalar(value));
        Ok(())
    }

    /// Store an array parameter from its wire payload (`count,v0,v1,…`).
    pub fn insert_array(&mut self, id: i32, payload: &str) -> Result<(), String> {
        let mut parts = payload.split(',');
        let count_tok = parts.next().unwrap_or("");
        let count: usize = count_tok
            .parse()
            .map_err(|_| format!("invalid array count '{count_tok}'"))?;
        let values: Vec<DualScalar> = parts.map(parse_dual).collect::<Result<_, _>>()?;
        if values.len() != count {
            return Err(format!(
                "array declares {count} elements but carries {}",
                values.len()
            ));
        }
        self.entries.insert(id, ParamEntry::Array(values));
        Ok(())
    }

    pub fn get_int(&self, id: i32, default: i32) -> i32 {
        match self.entries.get(&id) {
            Some(ParamEntry::Scalar(v)) => v.int,
            _ => default,
        }
    }

    pub fn get_float(&self, id: i32, default: f32) -> f32 {
        match self.entries.get(&id) {
            Some(ParamEntry::Scalar(v)) => v.float,
            _ => default,
        }
    }

    /// Array getter; absence is an empty array.
    pub fn get_int_array(&self, id: i32) -> Vec<i32> {
        match self.entries.get(&id) {
            Some(ParamEntry::Array(v)) => v.iter().map(|e| e.int).collect(),
            _ => Vec::new(),
        }
    }

    pub fn get_float_array(&self, id: i32) -> Vec<f32> {
        match self.entries.get(&id) {
            Some(ParamEntry::Array(v)) => v.iter().map(|e| e.float).collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_dual_parse() {
        let mut pd = ParamDict::new();
        pd.insert_scalar(0, "-233").unwrap();
        pd.insert_scalar(1, "0.500000").unwrap();
        assert_eq!(pd.get_int(0, 0), -233);
        assert_eq!(pd.get_float(0, 0.0), -233.0);
        assert_eq!(pd.get_float(1, 0.0), 0.5);
        // fractional token truncates when read as int
        assert_eq!(pd.get_int(1, 7), 0);
    }

    #[test]
    fn absent_id_yields_default() {
        let pd = ParamDict::new();
        assert_eq!(pd.get_int(5, 42), 42);
        assert_eq!(pd.get_float(5, 1.5), 1.5);
        assert!(pd.get_float_array(10).is_empty());
    }

    #[test]
    fn array_parse() {
        let mut pd = ParamDict::new();
        pd.insert_array(10, "2,0.100000,6.000000").unwrap();
        assert_eq!(pd.get_float_array(10), vec![0.1, 6.0]);
        assert!(pd.insert_array(11, "3,1,2").is_err());
        assert!(pd.insert_array(12, "x,1").is_err());
    }
}

use crate::container::{AttrValue, Values};
use pretty_dtoa::{dtoa, FmtFloatConfig};

const FLOAT_CONFIG: FmtFloatConfig = FmtFloatConfig::default()
    .add_point_zero(false)
    .max_significant_digits(9);

pub fn format_f64(f: f64) -> String {
    dtoa(f, FLOAT_CONFIG)
}

pub fn format_f64_vec(v: &[f64]) -> String {
    let a: Vec<String> = v.iter().map(|f| format_f64(*f)).collect();
    format!("[{}]", a.join(", "))
}

pub fn format_attr(value: &AttrValue) -> String {
    match value {
        AttrValue::Int(i) => i.to_string(),
        AttrValue::Float(f) => format_f64(*f),
        AttrValue::Text(s) => s.clone(),
        AttrValue::Array(a) => format_f64_vec(a),
    }
}

/// Renders a shape tuple-style: `(2, 4)`, `(3,)` or `()`.
pub fn format_shape(shape: &[usize]) -> String {
    match shape {
        [n] => format!("({},)", n),
        _ => {
            let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
            format!("({})", dims.join(", "))
        }
    }
}

/// Renders flat row-major values as nested bracketed rows, one row of
/// the innermost dimension per line.
pub fn format_values(shape: &[usize], values: &Values) -> String {
    let elems: Vec<String> = match values {
        Values::Float(v) => v.iter().map(|f| format_f64(*f)).collect(),
        Values::Int(v) => v.iter().map(|i| i.to_string()).collect(),
        Values::Text(v) => v.iter().map(|s| format!("'{}'", s)).collect(),
    };
    if shape.is_empty() {
        return elems.into_iter().next().unwrap_or_default();
    }
    let mut out = String::new();
    nest(shape, &elems, 0, &mut out);
    out
}

fn nest(shape: &[usize], elems: &[String], depth: usize, out: &mut String) {
    out.push('[');
    if shape.len() == 1 {
        out.push_str(&elems.join(", "));
    } else {
        let stride: usize = shape[1..].iter().product();
        for i in 0..shape[0] {
            if i > 0 {
                out.push(',');
                out.push_str(&"\n".repeat(shape.len() - 1));
                out.push_str(&" ".repeat(depth + 1));
            }
            nest(&shape[1..], &elems[i * stride..(i + 1) * stride], depth + 1, out);
        }
    }
    out.push(']');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_values() {
        let v = Values::Float(vec![10.0, 5.0, 1.0, 1.0, 20.0, 8.5, 1.0, 1.0]);
        assert_eq!(
            format_values(&[2, 4], &v),
            "[[10, 5, 1, 1],\n [20, 8.5, 1, 1]]"
        );
        assert_eq!(format_values(&[2], &Values::Int(vec![0, 1])), "[0, 1]");
        assert_eq!(format_values(&[], &Values::Int(vec![7])), "7");
        assert_eq!(
            format_values(&[1], &Values::Text(vec!["L1".into()])),
            "['L1']"
        );
        assert_eq!(format_values(&[0, 2], &Values::Float(vec![])), "[]");
    }

    #[test]
    fn test_format_shape() {
        assert_eq!(format_shape(&[2, 4]), "(2, 4)");
        assert_eq!(format_shape(&[3]), "(3,)");
        assert_eq!(format_shape(&[]), "()");
    }

    #[test]
    fn test_format_attr() {
        assert_eq!(format_attr(&AttrValue::Int(3)), "3");
        assert_eq!(format_attr(&AttrValue::Float(1234.5)), "1234.5");
        assert_eq!(format_attr(&AttrValue::Array(vec![1.0, 2.5])), "[1, 2.5]");
    }
}

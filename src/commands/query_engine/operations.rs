use std::cmp::Ordering;
use indexmap::IndexMap;
use super::value::Value;
use super::context::PathElement;

/// jq truthiness: false and null are falsy
pub fn is_truthy(v: &Value) -> bool {
    v.is_truthy()
}

/// Deep equality check
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    a == b
}

/// Type ordering for jq: null < bool < number < string < array < object
fn type_order(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Compare two values of the same type for sorting
pub fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            a.partial_cmp(b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Array(a), Value::Array(b)) => {
            for (x, y) in a.iter().zip(b.iter()) {
                let c = compare(x, y);
                if c != Ordering::Equal {
                    return c;
                }
            }
            a.len().cmp(&b.len())
        }
        _ => Ordering::Equal,
    }
}

/// jq comparison with type ordering: null < bool < number < string < array < object
pub fn compare_jq(a: &Value, b: &Value) -> Ordering {
    let ta = type_order(a);
    let tb = type_order(b);
    if ta != tb {
        return ta.cmp(&tb);
    }
    compare(a, b)
}

/// Deep merge two objects. For non-objects, b wins.
pub fn deep_merge(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Object(obj_a), Value::Object(obj_b)) => {
            let mut result = obj_a.clone();
            for (key, val_b) in obj_b {
                if let Some(val_a) = obj_a.get(key) {
                    result.insert(key.clone(), deep_merge(val_a, val_b));
                } else {
                    result.insert(key.clone(), val_b.clone());
                }
            }
            Value::Object(result)
        }
        _ => b.clone(),
    }
}

/// jq containment semantics: a contains b
pub fn contains_deep(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(obj_a), Value::Object(obj_b)) => {
            for (key, val_b) in obj_b {
                match obj_a.get(key) {
                    Some(val_a) => {
                        if !contains_deep(val_a, val_b) {
                            return false;
                        }
                    }
                    None => return false,
                }
            }
            true
        }
        (Value::Array(arr_a), Value::Array(arr_b)) => {
            for val_b in arr_b {
                let found = arr_a.iter().any(|val_a| contains_deep(val_a, val_b));
                if !found {
                    return false;
                }
            }
            true
        }
        (Value::String(sa), Value::String(sb)) => sa.contains(sb.as_str()),
        _ => a == b,
    }
}

/// Calculate nesting depth of a value
pub fn get_value_depth(v: &Value, max_check: usize) -> usize {
    if max_check == 0 {
        return 0;
    }
    match v {
        Value::Array(arr) => {
            let max_child = arr
                .iter()
                .map(|item| get_value_depth(item, max_check - 1))
                .max()
                .unwrap_or(0);
            1 + max_child
        }
        Value::Object(obj) => {
            let max_child = obj
                .values()
                .map(|val| get_value_depth(val, max_check - 1))
                .max()
                .unwrap_or(0);
            1 + max_child
        }
        _ => 0,
    }
}

/// Set value at path, creating intermediates as needed
pub fn set_path(value: &Value, path: &[PathElement], new_val: Value) -> Value {
    if path.is_empty() {
        return new_val;
    }

    let first = &path[0];
    let rest = &path[1..];

    match first {
        PathElement::Key(key) => {
            let mut obj = match value {
                Value::Object(o) => o.clone(),
                _ => IndexMap::new(),
            };
            let existing = obj.get(key).cloned().unwrap_or(Value::Null);
            obj.insert(key.clone(), set_path(&existing, rest, new_val));
            Value::Object(obj)
        }
        PathElement::Index(idx) => {
            let mut arr = match value {
                Value::Array(a) => a.clone(),
                _ => Vec::new(),
            };
            let index = if *idx < 0 {
                let len = arr.len() as i64;
                ((len + idx).max(0)) as usize
            } else {
                *idx as usize
            };
            // Extend array if needed
            while arr.len() <= index {
                arr.push(Value::Null);
            }
            let existing = arr[index].clone();
            arr[index] = set_path(&existing, rest, new_val);
            Value::Array(arr)
        }
    }
}

/// Delete value at path
pub fn delete_path(value: &Value, path: &[PathElement]) -> Value {
    if path.is_empty() {
        return Value::Null;
    }

    if path.len() == 1 {
        match &path[0] {
            PathElement::Key(key) => {
                if let Value::Object(obj) = value {
                    let mut new_obj = obj.clone();
                    new_obj.shift_remove(key);
                    return Value::Object(new_obj);
                }
                return value.clone();
            }
            PathElement::Index(idx) => {
                if let Value::Array(arr) = value {
                    let index = if *idx < 0 {
                        let len = arr.len() as i64;
                        (len + idx) as usize
                    } else {
                        *idx as usize
                    };
                    if index < arr.len() {
                        let mut new_arr = arr.clone();
                        new_arr.remove(index);
                        return Value::Array(new_arr);
                    }
                }
                return value.clone();
            }
        }
    }

    let first = &path[0];
    let rest = &path[1..];

    match first {
        PathElement::Key(key) => {
            if let Value::Object(obj) = value {
                let mut new_obj = obj.clone();
                if let Some(child) = obj.get(key) {
                    new_obj.insert(key.clone(), delete_path(child, rest));
                }
                return Value::Object(new_obj);
            }
            value.clone()
        }
        PathElement::Index(idx) => {
            if let Value::Array(arr) = value {
                let index = if *idx < 0 {
                    let len = arr.len() as i64;
                    (len + idx) as usize
                } else {
                    *idx as usize
                };
                if index < arr.len() {
                    let mut new_arr = arr.clone();
                    new_arr[index] = delete_path(&arr[index], rest);
                    return Value::Array(new_arr);
                }
            }
            value.clone()
        }
    }
}

//! List operators. All of them are null-tolerant: a non-list input behaves as
//! the empty list. Producers fail once their result exceeds `max_list_len`.

use serde_json::Value;

use super::coerce::{js_compare, number_value, to_number, to_number_or, values_equal};
use super::{Args, Category, CodegenResult, OpError, OperatorSpec, Port, PyArgs, simple};
use crate::parse::DType;

fn items<'a>(args: &'a Args, name: &str) -> &'a [Value] {
    args.list(name).map(Vec::as_slice).unwrap_or(&[])
}

fn list_result(out: Vec<Value>, args: &Args) -> Result<Option<Value>, OpError> {
    args.check_len(out.len())?;
    Ok(Some(Value::Array(out)))
}

/// `Number.isFinite(Number(v)) ? Number(v) : default`.
fn finite_or(v: Option<&Value>, default: f64) -> f64 {
    let n = to_number(v);
    if n.is_finite() { n } else { default }
}

/// Integer length argument for `take`/`drop`: truncated, NaN → 0, never negative.
fn count_arg(args: &Args, name: &str) -> usize {
    let n = to_number_or(args.get(name), 0.0);
    if n.is_nan() || n <= 0.0 { 0 } else { n.trunc() as usize }
}

fn py(code: String) -> CodegenResult {
    CodegenResult::Single(code)
}

// -----------------------------------------------------------------------------
// Producers
// -----------------------------------------------------------------------------

fn range(args: &Args) -> Result<Option<Value>, OpError> {
    let start = to_number_or(args.get("start"), 0.0);
    let stop = to_number_or(args.get("stop"), 0.0);
    let step = to_number_or(args.get("step"), 1.0);
    if !start.is_finite() || !stop.is_finite() || !step.is_finite() || step == 0.0 {
        return Ok(Some(Value::Array(vec![])));
    }
    let span = ((stop - start) / step).ceil();
    let count = if span > 0.0 { span as usize } else { 0 };
    args.check_len(count)?;
    // Indexed rather than accumulated: `start + step` can round back to `start`.
    let out = (0..count)
        .map(|k| start + k as f64 * step)
        .take_while(|&i| (step > 0.0 && i < stop) || (step < 0.0 && i > stop))
        .map(number_value)
        .collect();
    list_result(out, args)
}

fn repeat(args: &Args) -> Result<Option<Value>, OpError> {
    let n = to_number_or(args.get("count"), 0.0).floor();
    let n = if n.is_nan() || n < 0.0 { 0 } else { n as usize };
    args.check_len(n)?;
    let value = args.get("value").cloned().unwrap_or(Value::Null);
    Ok(Some(Value::Array(vec![value; n])))
}

// -----------------------------------------------------------------------------
// Reductions
// -----------------------------------------------------------------------------

fn sum_list(args: &Args) -> Result<Option<Value>, OpError> {
    let total: f64 = items(args, "list")
        .iter()
        .map(|v| to_number_or(Some(v), 0.0))
        .sum();
    Ok(Some(number_value(total)))
}

fn product_list(args: &Args) -> Result<Option<Value>, OpError> {
    let total: f64 = items(args, "list")
        .iter()
        .map(|v| to_number_or(Some(v), 1.0))
        .product();
    Ok(Some(number_value(total)))
}

fn average_list(args: &Args) -> Result<Option<Value>, OpError> {
    let list = items(args, "list");
    if list.is_empty() {
        return Ok(Some(Value::from(0)));
    }
    let total: f64 = list.iter().map(|v| to_number_or(Some(v), 0.0)).sum();
    Ok(Some(number_value(total / list.len() as f64)))
}

/// `Math.min`/`Math.max` over the list; any NaN poisons the result.
fn extreme(args: &Args, pick: fn(f64, f64) -> f64) -> Result<Option<Value>, OpError> {
    let list = items(args, "list");
    if list.is_empty() {
        return Ok(None);
    }
    let mut acc: Option<f64> = None;
    for v in list {
        let n = to_number(Some(v));
        if n.is_nan() {
            return Ok(Some(Value::Null));
        }
        acc = Some(acc.map_or(n, |a| pick(a, n)));
    }
    Ok(acc.map(number_value))
}

fn length(args: &Args) -> Result<Option<Value>, OpError> {
    Ok(Some(Value::from(items(args, "list").len())))
}

// -----------------------------------------------------------------------------
// Transforms
// -----------------------------------------------------------------------------

fn map_add(args: &Args) -> Result<Option<Value>, OpError> {
    let add = to_number_or(args.get("add"), 0.0);
    let out = items(args, "list")
        .iter()
        .map(|x| number_value(to_number_or(Some(x), 0.0) + add))
        .collect();
    list_result(out, args)
}

fn map_mul(args: &Args) -> Result<Option<Value>, OpError> {
    let mul = to_number_or(args.get("mul"), 1.0);
    let out = items(args, "list")
        .iter()
        .map(|x| number_value(to_number_or(Some(x), 0.0) * mul))
        .collect();
    list_result(out, args)
}

fn slice(args: &Args) -> Result<Option<Value>, OpError> {
    let Some(list) = args.list("list") else {
        return Ok(Some(Value::Array(vec![])));
    };
    let len = list.len() as f64;
    let start = finite_or(args.get("start"), 0.0);
    let stop = finite_or(args.get("stop"), len);
    let step = finite_or(args.get("step"), 1.0);
    if step == 0.0 {
        return Ok(Some(Value::Array(vec![])));
    }
    let at = |i: f64| -> Value {
        if i < 0.0 || i.fract() != 0.0 {
            return Value::Null;
        }
        list.get(i as usize).cloned().unwrap_or(Value::Null)
    };
    let mut out = Vec::new();
    if step > 0.0 {
        let mut i = start.max(0.0);
        while i < stop.min(len) {
            out.push(at(i));
            args.check_len(out.len())?;
            i += step;
        }
    } else {
        let mut i = start.min(len - 1.0);
        while i > stop.max(-1.0) {
            out.push(at(i));
            args.check_len(out.len())?;
            i += step;
        }
    }
    Ok(Some(Value::Array(out)))
}

fn reverse(args: &Args) -> Result<Option<Value>, OpError> {
    let out = items(args, "list").iter().rev().cloned().collect();
    list_result(out, args)
}

fn sort_asc(args: &Args) -> Result<Option<Value>, OpError> {
    let mut out = items(args, "list").to_vec();
    out.sort_by(js_compare);
    list_result(out, args)
}

fn sort_desc(args: &Args) -> Result<Option<Value>, OpError> {
    let mut out = items(args, "list").to_vec();
    out.sort_by(|a, b| js_compare(b, a));
    list_result(out, args)
}

fn unique(args: &Args) -> Result<Option<Value>, OpError> {
    let mut out: Vec<Value> = Vec::new();
    for v in items(args, "list") {
        if !out.iter().any(|seen| values_equal(Some(seen), Some(v))) {
            out.push(v.clone());
        }
    }
    list_result(out, args)
}

fn zip(args: &Args) -> Result<Option<Value>, OpError> {
    let (Some(a), Some(b)) = (args.list("a"), args.list("b")) else {
        return Ok(Some(Value::Array(vec![])));
    };
    let out = a
        .iter()
        .zip(b)
        .map(|(x, y)| Value::Array(vec![x.clone(), y.clone()]))
        .collect();
    list_result(out, args)
}

fn enumerate(args: &Args) -> Result<Option<Value>, OpError> {
    let out = items(args, "list")
        .iter()
        .enumerate()
        .map(|(i, v)| Value::Array(vec![Value::from(i), v.clone()]))
        .collect();
    list_result(out, args)
}

fn flatten(args: &Args) -> Result<Option<Value>, OpError> {
    let mut out = Vec::new();
    for v in items(args, "list") {
        match v {
            Value::Array(inner) => out.extend(inner.iter().cloned()),
            other => out.push(other.clone()),
        }
    }
    list_result(out, args)
}

fn filter_eq(args: &Args) -> Result<Option<Value>, OpError> {
    let needle = args.get("value");
    let out = items(args, "list")
        .iter()
        .filter(|x| values_equal(Some(*x), needle))
        .cloned()
        .collect();
    list_result(out, args)
}

fn take(args: &Args) -> Result<Option<Value>, OpError> {
    let list = items(args, "list");
    let n = count_arg(args, "n").min(list.len());
    list_result(list[..n].to_vec(), args)
}

fn drop(args: &Args) -> Result<Option<Value>, OpError> {
    let list = items(args, "list");
    let n = count_arg(args, "n").min(list.len());
    list_result(list[n..].to_vec(), args)
}

fn chunk(args: &Args) -> Result<Option<Value>, OpError> {
    let size = to_number_or(args.get("size"), 1.0).floor();
    let size = if size.is_nan() || size < 1.0 { 1 } else { size as usize };
    let out = items(args, "list")
        .chunks(size)
        .map(|c| Value::Array(c.to_vec()))
        .collect();
    list_result(out, args)
}

// -----------------------------------------------------------------------------
// Registry
// -----------------------------------------------------------------------------

fn one_list(label: &'static str) -> Vec<Port> {
    vec![Port::new("list", DType::List, label)]
}

fn list_and(id: &'static str, dtype: DType, label: &'static str) -> Vec<Port> {
    vec![Port::new("list", DType::List, "List"), Port::new(id, dtype, label)]
}

pub(super) fn specs() -> Vec<OperatorSpec> {
    use Category::{List, Loop};
    use DType::{Any, Number};
    vec![
        simple(
            "range",
            "Range",
            Loop,
            "List of numbers from Start to Stop (exclusive) stepping by Step.",
            vec![
                Port::new("start", Number, "Start"),
                Port::new("stop", Number, "Stop"),
                Port::new("step", Number, "Step"),
            ],
            DType::List,
            range,
            |a| py(format!("list(range({}, {}, {}))", a.get("start"), a.get("stop"), a.get("step"))),
        ),
        simple(
            "sum_list",
            "Sum",
            List,
            "Sum of all numbers in List.",
            one_list("List"),
            Number,
            sum_list,
            |a| py(format!("sum({})", a.get("list"))),
        ),
        simple(
            "map_add",
            "Map +",
            List,
            "Add constant (+) to each element of List.",
            list_and("add", Number, "+"),
            DType::List,
            map_add,
            |a| py(format!("[ (x + {}) for x in {} ]", a.get("add"), a.get("list"))),
        ),
        simple(
            "map_mul",
            "Map ×",
            List,
            "Multiply each element of List by ×.",
            list_and("mul", Number, "×"),
            DType::List,
            map_mul,
            |a| py(format!("[ (x * {}) for x in {} ]", a.get("mul"), a.get("list"))),
        ),
        simple(
            "length",
            "Length",
            List,
            "Number of elements in List.",
            one_list("List"),
            Number,
            length,
            |a| py(format!("len({})", a.get("list"))),
        ),
        simple(
            "slice",
            "Slice",
            List,
            "Slice list[start:stop:step].",
            vec![
                Port::new("list", DType::List, "List"),
                Port::new("start", Number, "Start"),
                Port::new("stop", Number, "Stop"),
                Port::new("step", Number, "Step"),
            ],
            DType::List,
            slice,
            |a| {
                py(format!(
                    "{}[{}:{}:{}]",
                    a.get("list"),
                    a.get("start"),
                    a.get("stop"),
                    a.get("step")
                ))
            },
        ),
        simple(
            "reverse",
            "Reverse",
            List,
            "Reverse order of items.",
            one_list("List"),
            DType::List,
            reverse,
            |a| py(format!("{}[::-1]", a.get("list"))),
        ),
        simple(
            "sort_asc",
            "Sort ↑",
            List,
            "Sort ascending (Python sorted).",
            one_list("List"),
            DType::List,
            sort_asc,
            |a| py(format!("sorted({})", a.get("list"))),
        ),
        simple(
            "sort_desc",
            "Sort ↓",
            List,
            "Sort descending.",
            one_list("List"),
            DType::List,
            sort_desc,
            |a| py(format!("sorted({}, reverse=True)", a.get("list"))),
        ),
        simple(
            "unique",
            "Unique",
            List,
            "Remove duplicates (preserve order).",
            one_list("List"),
            DType::List,
            unique,
            |a| py(format!("list(dict.fromkeys({}))", a.get("list"))),
        ),
        simple(
            "zip",
            "Zip",
            List,
            "Zip two lists into pairs.",
            vec![Port::new("a", DType::List, "A"), Port::new("b", DType::List, "B")],
            DType::List,
            zip,
            |a| py(format!("list(zip({}, {}))", a.get("a"), a.get("b"))),
        ),
        simple(
            "enumerate",
            "Enumerate",
            List,
            "Pairs of (index, value).",
            one_list("List"),
            DType::List,
            enumerate,
            |a| py(format!("list(enumerate({}))", a.get("list"))),
        ),
        simple(
            "flatten",
            "Flatten",
            List,
            "Flatten one level (list of lists → list).",
            one_list("List of Lists"),
            DType::List,
            flatten,
            |a| py(format!("[y for x in {} for y in x]", a.get("list"))),
        ),
        simple(
            "filter_eq",
            "Filter ==",
            List,
            "Keep items equal to Value.",
            list_and("value", Any, "Value"),
            DType::List,
            filter_eq,
            |a| py(format!("[x for x in {} if x == {}]", a.get("list"), a.get("value"))),
        ),
        simple(
            "take",
            "Take",
            List,
            "First N items.",
            list_and("n", Number, "N"),
            DType::List,
            take,
            |a| py(format!("{}[:{}]", a.get("list"), a.get("n"))),
        ),
        simple(
            "drop",
            "Drop",
            List,
            "All but first N items.",
            list_and("n", Number, "N"),
            DType::List,
            drop,
            |a| py(format!("{}[{}:]", a.get("list"), a.get("n"))),
        ),
        simple(
            "chunk",
            "Chunk",
            List,
            "Split list into chunks of Size.",
            list_and("size", Number, "Size"),
            DType::List,
            chunk,
            |a| {
                let (list, size) = (a.get("list"), a.get("size"));
                py(format!("[{list}[i:i+{size}] for i in range(0, len({list}), {size})]"))
            },
        ),
        simple(
            "repeat",
            "Repeat",
            List,
            "Repeat Value 'count' times.",
            vec![Port::new("value", Any, "Value"), Port::new("count", Number, "Count")],
            DType::List,
            repeat,
            |a| py(format!("[{}] * {}", a.get("value"), a.get("count"))),
        ),
        simple(
            "min_list",
            "Min",
            List,
            "Minimum value.",
            one_list("List"),
            Number,
            |a| extreme(a, f64::min),
            |a| py(format!("min({})", a.get("list"))),
        ),
        simple(
            "max_list",
            "Max",
            List,
            "Maximum value.",
            one_list("List"),
            Number,
            |a| extreme(a, f64::max),
            |a| py(format!("max({})", a.get("list"))),
        ),
        simple(
            "average_list",
            "Average",
            List,
            "Average of numbers (0 if empty).",
            one_list("List"),
            Number,
            average_list,
            |a| {
                let list = a.get("list");
                py(format!("((sum({list})/len({list})) if len({list}) else 0)"))
            },
        ),
        simple(
            "product_list",
            "Product",
            List,
            "Multiply all numbers together.",
            one_list("List"),
            Number,
            product_list,
            |a| py(format!("math.prod({})", a.get("list"))),
        ),
    ]
}

//! Module-level helpers emitted ahead of every `compute(row)`.

use super::writer::CodeWriter;

const IMPORTS: &[&str] = &["from datetime import date, datetime", "import math"];

const GET_NESTED: &[&str] = &[
    "def get_nested(row, path):",
    "    cur = row",
    "    for key in path.split('.'):",
    "        if not isinstance(cur, dict):",
    "            return None",
    "        cur = cur.get(key)",
    "    return cur",
];

const SET_VAR: &[&str] = &[
    "def _set(vars, name, value):",
    "    vars[name] = value",
    "    return value",
];

const GET_VAR: &[&str] = &[
    "def _get(vars, name, default=None):",
    "    return vars.get(name, default)",
];

pub(super) fn write_prelude(w: &mut CodeWriter) {
    w.lines(IMPORTS);
    for block in [GET_NESTED, SET_VAR, GET_VAR] {
        w.blank();
        w.lines(block);
    }
    w.blank();
}

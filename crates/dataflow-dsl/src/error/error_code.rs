//! Error codes for the definition language diagnostics.
//!
//! Codes are stable numbers rendered with an `E` suffix (`143E`). They are
//! grouped by the phase that raises them:
//! - `E100`..`E119` - Tokenizer and shared argument errors
//! - `E122`..`E148` - Stream definition errors
//! - `E150`..`E168` - Task definition and validation errors
//! - `E169`..`E173` - Late additions for app lists, channels and graphs

use std::fmt;

use crate::{error::Diagnostic, span::Span};

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Tokenizer and argument errors
    // =========================================================================
    /// Unexpected data after a complete stream definition.
    E100,

    /// Whitespace between `--` and the option name.
    E101,

    /// Whitespace between the argument name and `=`.
    E102,

    /// Whitespace between `=` and the argument value.
    E103,

    /// More tokens remain after a valid stream.
    E104,

    /// The token after `=` is not a usable argument value.
    E105,

    /// A double quoted string is never closed.
    E106,

    /// A single quoted string is never closed.
    E107,

    /// A one character operator was used where a pair is required.
    E108,

    /// The parser found a different token than the grammar requires.
    E111,

    /// Input ended before the definition was complete.
    E112,

    /// A backslash appeared outside a quoted value.
    E114,

    /// A character that has no meaning in a stream definition.
    E115,

    /// A stream reference that cannot be resolved.
    E116,

    /// An app reference that cannot be resolved.
    E117,

    /// An app name was expected.
    E118,

    /// An argument is glued to the app name.
    E119,

    // =========================================================================
    // Stream definition errors
    // =========================================================================
    /// The stream name is not a legal name.
    E122,

    /// The task name is not a legal name.
    E123,

    /// An app name appears more than once in a stream.
    E129,

    /// The stream is named after one of its own apps.
    E130,

    /// A queue or topic channel was given index components.
    E131,

    /// Only a tap on a stream, task or job can carry index components.
    E132,

    /// A sink position holds an identifier that is not a destination.
    E133,

    /// A source channel must start with `queue`, `topic` or `tap`.
    E134,

    /// Whitespace inside a destination or channel name.
    E139,

    /// Whitespace between a label and its colon.
    E140,

    /// A tap needs a prefix, a scope and a name.
    E141,

    /// A tap names a scope that cannot be tapped.
    E142,

    /// Two apps in a stream share the same label.
    E143,

    /// An app reference matches more than one app.
    E144,

    /// Whitespace around the dot of a dotted argument name.
    E145,

    /// A destination is used where this kind of definition forbids it.
    E146,

    /// A label colon must be followed by whitespace.
    E147,

    /// A label colon with nothing to label.
    E148,

    // =========================================================================
    // Task definition errors
    // =========================================================================
    /// A lone `&` in a task definition.
    E150,

    /// A lone `|` in a task definition.
    E151,

    /// A lone `-` where `->` was expected.
    E152,

    /// A transition status without an arrow.
    E153,

    /// An unquoted transition status that is not a number.
    E154,

    /// A label placed on a parenthesized group.
    E155,

    /// More than one label on the same element.
    E156,

    /// An arrow with no exit status before it.
    E157,

    /// A secondary sequence without a label can never run.
    E158,

    /// The same label is defined twice.
    E159,

    /// A transition targets a label that no element defines.
    E160,

    /// A task app in a composed definition is not registered.
    E161,

    /// A character that has no meaning in a task definition.
    E162,

    /// More tokens remain after a valid task.
    E163,

    /// A label shares its text with an unlabeled app name.
    E164,

    /// An unlabeled app name shares its text with a label.
    E165,

    /// The same unlabeled app appears twice.
    E166,

    /// A split that runs only one flow.
    E167,

    /// An argument given to a task app outside app mode.
    E168,

    // =========================================================================
    // App list, channel and graph errors
    // =========================================================================
    /// `|` and `||` mixed in one app list.
    E169,

    /// `||` used in a stream that has a source or sink destination.
    E170,

    /// Unexpected data inside a destination name.
    E171,

    /// A sink channel must start with `queue` or `topic`.
    E172,

    /// Graph lowering met a label that no sequence defines.
    E173,
}

impl ErrorCode {
    /// Returns the numeric code.
    pub fn number(&self) -> u16 {
        match self {
            ErrorCode::E100 => 100,
            ErrorCode::E101 => 101,
            ErrorCode::E102 => 102,
            ErrorCode::E103 => 103,
            ErrorCode::E104 => 104,
            ErrorCode::E105 => 105,
            ErrorCode::E106 => 106,
            ErrorCode::E107 => 107,
            ErrorCode::E108 => 108,
            ErrorCode::E111 => 111,
            ErrorCode::E112 => 112,
            ErrorCode::E114 => 114,
            ErrorCode::E115 => 115,
            ErrorCode::E116 => 116,
            ErrorCode::E117 => 117,
            ErrorCode::E118 => 118,
            ErrorCode::E119 => 119,
            ErrorCode::E122 => 122,
            ErrorCode::E123 => 123,
            ErrorCode::E129 => 129,
            ErrorCode::E130 => 130,
            ErrorCode::E131 => 131,
            ErrorCode::E132 => 132,
            ErrorCode::E133 => 133,
            ErrorCode::E134 => 134,
            ErrorCode::E139 => 139,
            ErrorCode::E140 => 140,
            ErrorCode::E141 => 141,
            ErrorCode::E142 => 142,
            ErrorCode::E143 => 143,
            ErrorCode::E144 => 144,
            ErrorCode::E145 => 145,
            ErrorCode::E146 => 146,
            ErrorCode::E147 => 147,
            ErrorCode::E148 => 148,
            ErrorCode::E150 => 150,
            ErrorCode::E151 => 151,
            ErrorCode::E152 => 152,
            ErrorCode::E153 => 153,
            ErrorCode::E154 => 154,
            ErrorCode::E155 => 155,
            ErrorCode::E156 => 156,
            ErrorCode::E157 => 157,
            ErrorCode::E158 => 158,
            ErrorCode::E159 => 159,
            ErrorCode::E160 => 160,
            ErrorCode::E161 => 161,
            ErrorCode::E162 => 162,
            ErrorCode::E163 => 163,
            ErrorCode::E164 => 164,
            ErrorCode::E165 => 165,
            ErrorCode::E166 => 166,
            ErrorCode::E167 => 167,
            ErrorCode::E168 => 168,
            ErrorCode::E169 => 169,
            ErrorCode::E170 => 170,
            ErrorCode::E171 => 171,
            ErrorCode::E172 => 172,
            ErrorCode::E173 => 173,
        }
    }

    /// Returns the rendered code, e.g. `"143E"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E100 => "100E",
            ErrorCode::E101 => "101E",
            ErrorCode::E102 => "102E",
            ErrorCode::E103 => "103E",
            ErrorCode::E104 => "104E",
            ErrorCode::E105 => "105E",
            ErrorCode::E106 => "106E",
            ErrorCode::E107 => "107E",
            ErrorCode::E108 => "108E",
            ErrorCode::E111 => "111E",
            ErrorCode::E112 => "112E",
            ErrorCode::E114 => "114E",
            ErrorCode::E115 => "115E",
            ErrorCode::E116 => "116E",
            ErrorCode::E117 => "117E",
            ErrorCode::E118 => "118E",
            ErrorCode::E119 => "119E",
            ErrorCode::E122 => "122E",
            ErrorCode::E123 => "123E",
            ErrorCode::E129 => "129E",
            ErrorCode::E130 => "130E",
            ErrorCode::E131 => "131E",
            ErrorCode::E132 => "132E",
            ErrorCode::E133 => "133E",
            ErrorCode::E134 => "134E",
            ErrorCode::E139 => "139E",
            ErrorCode::E140 => "140E",
            ErrorCode::E141 => "141E",
            ErrorCode::E142 => "142E",
            ErrorCode::E143 => "143E",
            ErrorCode::E144 => "144E",
            ErrorCode::E145 => "145E",
            ErrorCode::E146 => "146E",
            ErrorCode::E147 => "147E",
            ErrorCode::E148 => "148E",
            ErrorCode::E150 => "150E",
            ErrorCode::E151 => "151E",
            ErrorCode::E152 => "152E",
            ErrorCode::E153 => "153E",
            ErrorCode::E154 => "154E",
            ErrorCode::E155 => "155E",
            ErrorCode::E156 => "156E",
            ErrorCode::E157 => "157E",
            ErrorCode::E158 => "158E",
            ErrorCode::E159 => "159E",
            ErrorCode::E160 => "160E",
            ErrorCode::E161 => "161E",
            ErrorCode::E162 => "162E",
            ErrorCode::E163 => "163E",
            ErrorCode::E164 => "164E",
            ErrorCode::E165 => "165E",
            ErrorCode::E166 => "166E",
            ErrorCode::E167 => "167E",
            ErrorCode::E168 => "168E",
            ErrorCode::E169 => "169E",
            ErrorCode::E170 => "170E",
            ErrorCode::E171 => "171E",
            ErrorCode::E172 => "172E",
            ErrorCode::E173 => "173E",
        }
    }

    /// Returns a short description used as the label of the primary span.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E100 => "unexpected data after stream",
            ErrorCode::E101 => "whitespace before option name",
            ErrorCode::E102 => "whitespace before '='",
            ErrorCode::E103 => "whitespace before option value",
            ErrorCode::E104 => "more input after stream",
            ErrorCode::E105 => "expected argument value",
            ErrorCode::E106 => "unterminated double quoted string",
            ErrorCode::E107 => "unterminated single quoted string",
            ErrorCode::E108 => "missing character",
            ErrorCode::E111 => "unexpected token",
            ErrorCode::E112 => "unexpected end of input",
            ErrorCode::E114 => "unexpected escape",
            ErrorCode::E115 => "unexpected data",
            ErrorCode::E116 => "unrecognized stream",
            ErrorCode::E117 => "unrecognized app",
            ErrorCode::E118 => "expected app name",
            ErrorCode::E119 => "missing whitespace before argument",
            ErrorCode::E122 => "illegal stream name",
            ErrorCode::E123 => "illegal task name",
            ErrorCode::E129 => "ambiguous app name",
            ErrorCode::E130 => "stream name matches app name",
            ErrorCode::E131 => "channel cannot be indexed",
            ErrorCode::E132 => "tap cannot be indexed",
            ErrorCode::E133 => "expected destination prefix",
            ErrorCode::E134 => "expected channel prefix",
            ErrorCode::E139 => "whitespace in destination name",
            ErrorCode::E140 => "whitespace before label colon",
            ErrorCode::E141 => "incomplete tap",
            ErrorCode::E142 => "cannot tap this",
            ErrorCode::E143 => "duplicate label",
            ErrorCode::E144 => "app reference not unique",
            ErrorCode::E145 => "whitespace in dotted name",
            ErrorCode::E146 => "destination not supported",
            ErrorCode::E147 => "missing whitespace after label",
            ErrorCode::E148 => "expected name after label",
            ErrorCode::E150 => "expected '&&'",
            ErrorCode::E151 => "expected '||'",
            ErrorCode::E152 => "expected '->'",
            ErrorCode::E153 => "missing transition arrow",
            ErrorCode::E154 => "invalid transition condition",
            ErrorCode::E155 => "label on group",
            ErrorCode::E156 => "multiple labels",
            ErrorCode::E157 => "arrow without exit status",
            ErrorCode::E158 => "unreachable sequence",
            ErrorCode::E159 => "label already defined",
            ErrorCode::E160 => "undefined label",
            ErrorCode::E161 => "unknown task",
            ErrorCode::E162 => "unexpected data",
            ErrorCode::E163 => "more input after task",
            ErrorCode::E164 => "label clashes with app name",
            ErrorCode::E165 => "app name clashes with label",
            ErrorCode::E166 => "duplicate app name",
            ErrorCode::E167 => "split with one flow",
            ErrorCode::E168 => "arguments not allowed",
            ErrorCode::E169 => "mixed '|' and '||'",
            ErrorCode::E170 => "'||' with destinations",
            ErrorCode::E171 => "unexpected data in destination",
            ErrorCode::E172 => "expected channel prefix",
            ErrorCode::E173 => "unresolved label",
        }
    }

    /// Returns the message template. `{N}` marks the N-th insert.
    pub fn template(&self) -> &'static str {
        match self {
            ErrorCode::E100 => "Found unexpected data after stream definition: '{0}'",
            ErrorCode::E101 => "No whitespace allowed between '--' and option name",
            ErrorCode::E102 => "No whitespace allowed after argument name and before '='",
            ErrorCode::E103 => "No whitespace allowed after '=' and before option value",
            ErrorCode::E104 => "After parsing a valid stream, there is still more data: '{0}'",
            ErrorCode::E105 => "Expected an argument value but was '{0}'",
            ErrorCode::E106 => "Cannot find terminating \" for string",
            ErrorCode::E107 => "Cannot find terminating ' for string",
            ErrorCode::E108 => "missing expected character '{0}'",
            ErrorCode::E111 => "Unexpected token.  Expected '{0}' but was '{1}'",
            ErrorCode::E112 => "Unexpectedly ran out of input",
            ErrorCode::E114 => "unexpected escape character.",
            ErrorCode::E115 => "unexpected data in stream definition '{0}'",
            ErrorCode::E116 => "unrecognized stream reference '{0}'",
            ErrorCode::E117 => "unrecognized app reference '{0}'",
            ErrorCode::E118 => "expected app name but found '{0}'",
            ErrorCode::E119 => "expected whitespace after app name and before argument",
            ErrorCode::E122 => "illegal name for a stream '{0}'",
            ErrorCode::E123 => "illegal name for a task '{0}'",
            ErrorCode::E129 => {
                "ambiguous app name '{0}' in stream named '{1}', appears at both position {2} and {3}"
            }
            ErrorCode::E130 => "Stream name '{0}' same as that of its apps' names is not allowed.",
            ErrorCode::E131 => "Channel does not support indexing",
            ErrorCode::E132 => "Only a tap on a stream, task or job can be indexed",
            ErrorCode::E133 => "Expected destination prefix but found '{0}'",
            ErrorCode::E134 => "Expected channel prefix of 'queue', 'topic' or 'tap' but found '{0}'",
            ErrorCode::E139 => "no whitespace allowed between components in a destination name",
            ErrorCode::E140 => "no whitespace allowed between label name and colon",
            ErrorCode::E141 => {
                "a tap needs at least three components (tap:queue:[name], tap:topic:[name], \
                 tap:stream:[streamname], tap:task:[taskname] or tap:job:[jobname])"
            }
            ErrorCode::E142 => {
                "tapping only allowed on 'stream', 'task', 'job', 'topic' or 'queue'. Not allowed on '{0}'"
            }
            ErrorCode::E143 => {
                "label '{0}' should be unique but app '{1}' (at position {2}) and app '{3}' \
                 (at position {4}) both use it"
            }
            ErrorCode::E144 => {
                "reference to '{0}' is not unique in the target stream '{1}', please label the \
                 relevant app and use the label, or use a suffix index to indicate which \
                 occurrence of the app, e.g. '{0}.0'"
            }
            ErrorCode::E145 => "no whitespace is allowed between dot and components of a name",
            ErrorCode::E146 => "a destination is not supported in this kind of definition",
            ErrorCode::E147 => "whitespace is expected after an app label",
            ErrorCode::E148 => "stream name is expected after an app label",
            ErrorCode::E150 => "task dsl flow requires a pair of &, not just one",
            ErrorCode::E151 => "task dsl requires a pair of '|'",
            ErrorCode::E152 => "expected '->' and not just the hyphen",
            ErrorCode::E153 => "expected '->' to follow state when specifying transition",
            ErrorCode::E154 => {
                "transition conditions must be quoted literals, numerics or '*' but '{0}' is not"
            }
            ErrorCode::E155 => "labels cannot be specified on parenthesized groups",
            ErrorCode::E156 => "multiple labels are not supported",
            ErrorCode::E157 => {
                "transition arrow must be preceeded by the exit code that should drive the transition"
            }
            ErrorCode::E158 => "secondary sequences must have labels or are unreachable",
            ErrorCode::E159 => "this label has already been defined",
            ErrorCode::E160 => "transition specifies an undefined label",
            ErrorCode::E161 => "task in composed task definition does not exist",
            ErrorCode::E162 => "unexpected data in task definition '{0}'",
            ErrorCode::E163 => "after parsing a valid task, there is still more data: '{0}'",
            ErrorCode::E164 => "the label clashes with an existing unlabeled task application name",
            ErrorCode::E165 => "the app name clashes with an existing label",
            ErrorCode::E166 => "duplicate app name. Use a label to ensure uniqueness",
            ErrorCode::E167 => {
                "unnecessary use of split construct when only one flow to execute in parallel"
            }
            ErrorCode::E168 => "arguments not allowed unless parser is in app mode",
            ErrorCode::E169 => "do not mix '|' and '||' when specifying a list of applications",
            ErrorCode::E170 => {
                "do not use '||' between source/processor/sink apps in a stream, use '|'"
            }
            ErrorCode::E171 => "unexpected data in destination name '{0}'",
            ErrorCode::E172 => "Expected channel prefix of 'queue' or 'topic' but found '{0}'",
            ErrorCode::E173 => "no sequence defines the label '{0}' targeted by a transition",
        }
    }

    /// Substitutes `inserts` into the message template.
    ///
    /// Placeholders without a matching insert are left as written.
    pub fn format(&self, inserts: &[&str]) -> String {
        let template = self.template();
        let mut message = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            message.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let index = after
                .find('}')
                .and_then(|close| after[..close].parse::<usize>().ok().map(|i| (i, close)));
            match index.and_then(|(i, close)| inserts.get(i).map(|insert| (insert, close))) {
                Some((insert, close)) => {
                    message.push_str(insert);
                    rest = &after[close + 1..];
                }
                None => {
                    message.push('{');
                    rest = after;
                }
            }
        }
        message.push_str(rest);
        message
    }

    /// Builds an error diagnostic for this code with a primary label on `span`.
    pub fn diagnostic(self, span: Span, inserts: &[&str]) -> Diagnostic {
        Diagnostic::error(self.format(inserts))
            .with_code(self)
            .with_label(span, self.description())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

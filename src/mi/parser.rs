use crate::engine::BreakpointLocation;
use crate::error::Error;
use chumsky::error::Rich;
use chumsky::prelude::{any, choice, end, just};
use chumsky::{extra, text, Parser};

type Err<'a> = extra::Err<Rich<'a, char>>;

/// Split inbound protocol line: `[token]-verb arguments`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub token: Option<String>,
    pub verb: String,
    /// Raw argument text, consumed later by a command argument set.
    pub args: String,
}

fn token<'a>() -> impl Parser<'a, &'a str, &'a str, Err<'a>> + Clone {
    text::digits(10).at_least(1).to_slice()
}

fn command_line<'a>() -> impl Parser<'a, &'a str, CommandLine, Err<'a>> {
    let token = token().or_not();
    let verb = any()
        .filter(|c: &char| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .repeated()
        .at_least(1)
        .to_slice()
        .labelled("command name");
    let args = text::whitespace()
        .at_least(1)
        .ignore_then(any().repeated().to_slice())
        .or_not();

    token
        .then_ignore(just('-').or_not())
        .then(verb)
        .then(args)
        .then_ignore(end())
        .map(|((token, verb), args): ((Option<&str>, &str), Option<&str>)| CommandLine {
            token: token.map(ToString::to_string),
            verb: verb.to_string(),
            args: args.unwrap_or_default().trim().to_string(),
        })
}

/// Parse protocol line. Return `None` for blank lines.
pub fn parse_command_line(line: &str) -> Result<Option<CommandLine>, Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    command_line()
        .parse(line)
        .into_result()
        .map(Some)
        .map_err(|e| Error::Parsing(e[0].to_string()))
}

/// Return leading token of a line, even if the rest of the line is malformed.
pub fn command_token(line: &str) -> Option<String> {
    token()
        .then_ignore(any().repeated())
        .parse(line.trim())
        .into_output()
        .map(ToString::to_string)
}

fn address<'a>() -> impl Parser<'a, &'a str, u64, Err<'a>> + Clone {
    let hex = just("0x")
        .or(just("0X"))
        .ignore_then(text::digits(16).at_least(1).to_slice())
        .try_map(|s: &str, span| u64::from_str_radix(s, 16).map_err(|e| Rich::custom(span, e)));
    let dec = text::digits(10)
        .at_least(1)
        .to_slice()
        .try_map(|s: &str, span| s.parse::<u64>().map_err(|e| Rich::custom(span, e)));

    choice((hex, dec)).padded().labelled("address")
}

fn location<'a>() -> impl Parser<'a, &'a str, BreakpointLocation, Err<'a>> {
    let file = any()
        .filter(|c: &char| *c != ':')
        .repeated()
        .at_least(1)
        .to_slice();

    let at_addr = just('*')
        .ignore_then(address())
        .then_ignore(end())
        .map(BreakpointLocation::Address);

    let at_line = file
        .then_ignore(just(':'))
        .then(
            text::digits(10)
                .at_least(1)
                .to_slice()
                .try_map(|s: &str, span| s.parse::<u64>().map_err(|e| Rich::custom(span, e))),
        )
        .then_ignore(end())
        .map(|(file, line): (&str, u64)| BreakpointLocation::Line {
            file: file.trim().to_string(),
            line,
        });

    // function part must not start with ':', so `ns::fn` never splits into a file and a function
    let at_file_fn = file
        .then_ignore(just(':'))
        .then(
            any()
                .filter(|c: &char| *c != ':')
                .then(any().repeated())
                .to_slice(),
        )
        .then_ignore(end())
        .map(|(file, function): (&str, &str)| BreakpointLocation::FileFunction {
            file: file.trim().to_string(),
            function: function.trim().to_string(),
        });

    let at_fn = any()
        .filter(|c: &char| *c != '*')
        .then(any().repeated())
        .to_slice()
        .map(|function: &str| BreakpointLocation::Function(function.trim().to_string()));

    choice((at_addr, at_line, at_file_fn, at_fn)).labelled("breakpoint location")
}

/// Parse breakpoint location: `*address`, `file:line`, `file:function` or `function`.
pub fn parse_location(text: &str) -> Result<BreakpointLocation, Error> {
    let text = text.trim();
    location()
        .parse(text)
        .into_result()
        .map_err(|e| Error::Parsing(e[0].to_string()))
}

// Abstract syntax trees for column rules

/// Expression used by `format` and expression footers
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Bool(bool),
    /// Bound variable, e.g. `cell`
    Var(String),
    /// Single-quoted column key, e.g. `'price'`
    Column(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// `cond ? then : else`
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    /// String concatenation, `~`
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Classified `footer` rule
#[derive(Debug, Clone, PartialEq)]
pub enum FooterRule {
    Sum,
    Avg,
    /// Literal text shown as-is
    Label(String),
    /// Evaluated after all sums, averages and labels are known
    Expression(Expr),
}

/// Parsed `link` template
#[derive(Debug, Clone, PartialEq)]
pub struct LinkTemplate {
    /// Everything before the first `?`
    pub base: String,
    /// Query parameters, `None` when the template has no `?`
    pub query: Option<Vec<LinkParam>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkParam {
    pub key: String,
    pub value: LinkValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinkValue {
    /// `column[N]`: the current row's value at index N
    Column(usize),
    Literal(String),
    /// Parameter written without `=`
    Absent,
}

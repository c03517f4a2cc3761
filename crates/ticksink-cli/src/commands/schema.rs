use ticksink_warehouse::Dialect;

use crate::cli::{SchemaArgs, StoreKind};

use super::CommandOutput;

pub fn run(args: &SchemaArgs) -> CommandOutput {
    let dialect = match args.dialect {
        StoreKind::Postgres => Dialect::Postgres,
        StoreKind::DuckDb => Dialect::DuckDb,
    };
    CommandOutput::Text(dialect.schema_sql())
}

use tracing::info;

use crate::cli::ExportArgs;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::export::{self, Filter, Statement};

pub async fn run(ctx: &AppContext, args: ExportArgs) -> AppResult<()> {
    let (filter, statement, user) = split_args(args);
    let access_token = ctx.access_token().await?;

    info!(user = %user, query = %filter.query(), "starting export");
    export::run(&ctx.gmail_client, &user, &access_token, &filter, &statement).await
}

fn split_args(args: ExportArgs) -> (Filter, Statement, String) {
    let ExportArgs {
        message,
        label,
        from,
        to,
        subject,
        output,
        split,
        format,
        area,
        user,
    } = args;

    let filter = Filter {
        message_id: message,
        label,
        from,
        to,
        subject,
    };
    let statement = Statement {
        output,
        split,
        format,
        area,
    };

    (filter, statement, user)
}

use crate::cli::ListAction;
use crate::context::CliContext;
use crate::output::{self, Deleted};
use taskboard_domain::ListId;

pub async fn handle(ctx: &mut CliContext, action: ListAction) -> anyhow::Result<()> {
    match action {
        ListAction::Add { title } => {
            let list = ctx.session.create_list(&title).await?;
            ctx.session.settle().await?;
            output::output_success(ctx.format, &list)?;
        }
        ListAction::Rename { id, title } => {
            let list = ctx.session.rename_list(ListId(id), &title).await?;
            ctx.session.settle().await?;
            output::output_success(ctx.format, &list)?;
        }
        ListAction::Delete { id } => {
            ctx.session.delete_list(ListId(id)).await?;
            ctx.session.settle().await?;
            output::output_success(
                ctx.format,
                &Deleted {
                    kind: "list",
                    deleted: id,
                },
            )?;
        }
    }
    Ok(())
}

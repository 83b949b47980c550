use crate::cli::{CardAction, CardEditArgs};
use crate::context::CliContext;
use crate::output::{self, Deleted};
use taskboard_domain::{CardId, FieldUpdate, ListId, MoveOutcome};

pub async fn handle(ctx: &mut CliContext, action: CardAction) -> anyhow::Result<()> {
    match action {
        CardAction::Add {
            list,
            title,
            description,
        } => {
            let card = ctx
                .session
                .create_card(ListId(list), &title, description)
                .await?;
            let card = ctx.settled_card(card.id).await?;
            output::output_success(ctx.format, &card)?;
        }
        CardAction::Edit(args) => {
            let card_id = handle_edit(ctx, args).await?;
            let card = ctx.settled_card(card_id).await?;
            output::output_success(ctx.format, &card)?;
        }
        CardAction::Delete { id } => {
            ctx.session.delete_card(CardId(id)).await?;
            ctx.session.settle().await?;
            output::output_success(
                ctx.format,
                &Deleted {
                    kind: "card",
                    deleted: id,
                },
            )?;
        }
        CardAction::Move { id, to_list, index } => {
            let outcome = ctx
                .session
                .move_card_to(CardId(id), ListId(to_list), index.unwrap_or(usize::MAX))
                .await?;
            if let MoveOutcome::Rejected(reason) = outcome {
                anyhow::bail!("card {} was not moved: {}", id, reason);
            }
            let card = ctx.settled_card(CardId(id)).await?;
            output::output_success(ctx.format, &card)?;
        }
        CardAction::Priority { id, level } => {
            ctx.session.set_priority(CardId(id), level).await?;
            let card = ctx.settled_card(CardId(id)).await?;
            output::output_success(ctx.format, &card)?;
        }
        CardAction::Group { id, label } => {
            ctx.session.set_group(CardId(id), label.as_deref()).await?;
            let card = ctx.settled_card(CardId(id)).await?;
            output::output_success(ctx.format, &card)?;
        }
    }
    Ok(())
}

async fn handle_edit(ctx: &mut CliContext, args: CardEditArgs) -> anyhow::Result<CardId> {
    let description = match (args.description, args.clear_description) {
        (_, true) => FieldUpdate::Clear,
        (Some(description), false) => FieldUpdate::Set(description),
        (None, false) => FieldUpdate::NoChange,
    };
    if args.title.is_none() && !description.is_change() {
        anyhow::bail!("nothing to edit; pass --title, --description or --clear-description");
    }
    let card = ctx
        .session
        .edit_card(CardId(args.id), args.title, description)
        .await?;
    Ok(card.id)
}

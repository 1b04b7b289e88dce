use crate::engine::narrative_parser::OPTION_MARKERS;
use crate::model::game_context::GameContext;

/// Builds the directive that opens every generation request.
/// This struct is intentionally dumb: it only formats text.
/// No parsing, no networking, no engine logic.
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn build(context: &GameContext<'_>) -> String {
        let mut prompt = String::new();

        push_persona(&mut prompt, context);
        push_player_section(&mut prompt, context);
        push_finances(&mut prompt, context);
        push_chance_event(&mut prompt, context);
        push_tasks(&mut prompt, context);
        push_output_format(&mut prompt, context);
        push_reminder(&mut prompt);

        prompt
    }
}

fn push_persona(prompt: &mut String, context: &GameContext<'_>) {
    prompt.push_str(context.mode.persona());
    prompt.push_str("\n\n");
    prompt.push_str(&format!(
        "The player is founding a startup and must survive {} months. \
The conversation so far is replayed after this message; stay consistent with it.\n\n",
        context.horizon
    ));
}

fn push_player_section(prompt: &mut String, context: &GameContext<'_>) {
    let player = context.player;
    prompt.push_str("FOUNDER:\n");
    prompt.push_str(&format!("Name: {}\n", player.name));
    prompt.push_str(&format!("Startup idea: {}\n", player.venture));

    if !player.skills.is_empty() {
        prompt.push_str("Skills (0-10):\n");
        for (skill, score) in &player.skills {
            prompt.push_str(&format!("- {skill}: {score}\n"));
        }
    }

    if !player.traits.is_empty() {
        prompt.push_str("Traits:\n");
        for t in &player.traits {
            prompt.push_str(&format!("- {t}\n"));
        }
    }
    prompt.push('\n');
}

fn push_finances(prompt: &mut String, context: &GameContext<'_>) {
    let costs = context.costs;
    let stats = context.stats;

    prompt.push_str(&format!("MONTH {} FINANCES (already computed, do NOT recalculate):\n", context.month));
    prompt.push_str(&format!("- Salaries: {}\n", costs.salaries));
    prompt.push_str(&format!("- Servers: {}\n", costs.servers));
    prompt.push_str(&format!("- Marketing: {}\n", costs.marketing));
    if costs.debt_service != 0 {
        prompt.push_str(&format!("- Debt interest: {}\n", costs.debt_service));
    }
    if costs.founder_pay != 0 {
        prompt.push_str(&format!("- Founder salary: {}\n", costs.founder_pay));
    }
    prompt.push_str(&format!("- TOTAL deducted this month: {}\n\n", costs.total));

    prompt.push_str("CURRENT STATS (after the deduction):\n");
    prompt.push_str(&format!("- money: {}\n", stats.money));
    prompt.push_str(&format!("- team: {} (0-100)\n", stats.team));
    prompt.push_str(&format!("- motivation: {} (0-100)\n", stats.motivation));
    if let Some(debt) = stats.debt {
        prompt.push_str(&format!("- debt: {debt}\n"));
    }
    if let Some(marketing) = stats.marketing_cost {
        prompt.push_str(&format!("- marketing_cost: {marketing}\n"));
    }
    if let Some(pay) = stats.monthly_pay {
        prompt.push_str(&format!("- monthly_pay: {pay}\n"));
    }
    prompt.push('\n');
}

fn push_chance_event(prompt: &mut String, context: &GameContext<'_>) {
    let Some(event) = context.event else {
        return;
    };
    prompt.push_str("CHANCE EVENT (already applied to the stats above):\n");
    prompt.push_str(&format!(
        "{}: {} ({} {:+})\n",
        event.title, event.description, event.stat, event.delta
    ));
    prompt.push_str("Weave this event into the story.\n\n");
}

fn push_tasks(prompt: &mut String, context: &GameContext<'_>) {
    prompt.push_str(&format!(
        "YOUR TASKS:\n\
1. Interpret the player's latest move and describe its consequences.\n\
2. Decide the new stats. Start from CURRENT STATS; only add income, penalties \
and a new marketing_cost for next month. Do not deduct this month's costs again.\n\
3. Enforce termination: set game_over to true with a reason if money is below 0, \
team is 0 or less, motivation is 0 or less, or the company otherwise collapses.\n\
4. Write the next CRISIS or opportunity.\n\
5. End with exactly two options labeled {} and {}.\n\n",
        OPTION_MARKERS[0], OPTION_MARKERS[1]
    ));
    prompt.push_str(&format!("Set \"month\" to {}.\n\n", context.month + 1));
}

fn push_output_format(prompt: &mut String, context: &GameContext<'_>) {
    let (a, b) = (OPTION_MARKERS[0], OPTION_MARKERS[1]);
    prompt.push_str(
        "VISUAL RULES:\n\
- Make option titles **bold**.\n\
- Put a blank line between the options.\n\
- Do not cram the text together.\n\n",
    );
    prompt.push_str("OUTPUT FORMAT (JSON only, no markdown fences):\n");
    prompt.push_str(&format!(
        "{{\n\
  \"text\": \"Story...\\n\\n🔥 CRISIS: [details]...\\n\\nWhat will you do?\\n\\n**{a} [Title]**\\n[details]\\n\\n**{b} [Title]**\\n[details]\",\n\
  \"month\": {},\n\
  \"stats\": {{\"money\": 0, \"team\": 0, \"motivation\": 0, \"marketing_cost\": 0}},\n\
  \"game_over\": false,\n\
  \"game_over_reason\": \"\"\n\
}}\n\n",
        context.month + 1
    ));
}

fn push_reminder(prompt: &mut String) {
    prompt.push_str(
        "REMINDER: reply with ONE JSON object and nothing else. Keep the story short enough \
that both options always fit.\n",
    );
}

mod game;
mod gen;
mod leaderboard;
mod storage;

use std::sync::{Arc, Mutex};

use dotenv::dotenv;
use game::engine::{Outcome, RoundState};
use gen::client::GenClient;
use gen::hint::HintHelper;
use gen::pipeline::QuestionSourcing;
use leaderboard::Leaderboard;
use rand::rngs::StdRng;
use rand::SeedableRng;
use storage::{FileStore, KvStore};
use teloxide::{
    dispatching::dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
    prelude::*,
    types::{ChatId, KeyboardButton, KeyboardMarkup},
};

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type SharedStore = Arc<Mutex<FileStore>>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    ReceiveName,
    Menu,
    /// A round is being generated; further start requests wait here instead
    /// of racing the in-flight one.
    Generating,
    Playing {
        round: RoundState,
    },
}

type DialogueStorage = std::sync::Arc<ErasedStorage<State>>;

#[tokio::main]
async fn main() {
    dotenv().expect("Failed to load .env file");
    let credentials: Vec<String> = std::env::var("GEMINI_API_KEYS")
        .expect("GEMINI_API_KEYS is not set")
        .split(',')
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .collect();

    pretty_env_logger::init();
    log::info!("Starting QA Millionaire bot...");

    let bot = Bot::from_env();

    println!("Establishing connection to the database...");
    let dialogue_storage: DialogueStorage = SqliteStorage::open("db.sqlite", Json)
        .await
        .unwrap()
        .erase();
    println!("Connection established");

    let store: SharedStore = Arc::new(Mutex::new(FileStore::open("store.json")));

    let client = GenClient::new(credentials);
    let sourcing = Arc::new(QuestionSourcing::new(client.clone()));
    let hinter = Arc::new(HintHelper::new(client));

    let store_for_name = store.clone();
    let store_for_menu = store.clone();
    let store_for_game = store.clone();

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, ErasedStorage<State>, State>()
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(dptree::case![State::ReceiveName].endpoint(
                move |bot: Bot, dialogue: QuizDialogue, msg: Message| {
                    receive_name(store_for_name.clone(), bot, dialogue, msg)
                },
            ))
            .branch(dptree::case![State::Menu].endpoint(
                move |bot: Bot, dialogue: QuizDialogue, msg: Message| {
                    menu(sourcing.clone(), store_for_menu.clone(), bot, dialogue, msg)
                },
            ))
            .branch(dptree::case![State::Generating].endpoint(generating))
            .branch(dptree::case![State::Playing { round }].endpoint(
                move |bot: Bot, dialogue: QuizDialogue, round: RoundState, msg: Message| {
                    playing(
                        hinter.clone(),
                        store_for_game.clone(),
                        bot,
                        dialogue,
                        round,
                        msg,
                    )
                },
            )),
    )
    .dependencies(dptree::deps![dialogue_storage])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}

const GREETING_TEXT: &str =
    "Welcome to QA Millionaire! 🎬 Twenty ISTQB questions, three lives, three helps. What's your name?";

const START_GAME: &str = "▶️ Start quiz";
const SHOW_LEADERBOARD: &str = "🏆 Leaderboard";
const TOGGLE_NARRATION: &str = "🗣 Toggle narration";
const TOGGLE_SUSPENSE: &str = "🥁 Toggle suspense";

const HINT_HELP: &str = "💡 Hint";
const ELIMINATE_HELP: &str = "✂️ Eliminate two";
const SKIP_HELP: &str = "⏭ Skip";
const QUIT_GAME: &str = "🚪 Quit";

async fn start(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, GREETING_TEXT).await?;

    dialogue.update(State::ReceiveName).await?;
    Ok(())
}

async fn receive_name(
    store: SharedStore,
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
) -> HandlerResult {
    let name = match msg.text() {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => {
            bot.send_message(msg.chat.id, "Please type your name (as text)")
                .await?;
            return Ok(());
        }
    };

    store.lock().unwrap().set(storage::PLAYER_NAME_KEY, &name);
    bot.send_message(msg.chat.id, format!("Nice to meet you, {}!", name))
        .await?;
    bot.send_message(msg.chat.id, "What would you like to do?")
        .reply_markup(menu_keyboard())
        .await?;

    dialogue.update(State::Menu).await?;
    Ok(())
}

async fn menu(
    sourcing: Arc<QuestionSourcing>,
    store: SharedStore,
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
) -> HandlerResult {
    match msg.text() {
        Some(START_GAME) => {
            bot.send_message(msg.chat.id, "🤖 Preparing your 20 questions, one moment...")
                .await?;
            dialogue.update(State::Generating).await?;

            let mut rng = StdRng::from_entropy();
            let questions = sourcing.generate_round(&mut rng).await;
            log::info!("round started with {} questions", questions.len());

            // Move out of Generating before any send can fail, so an
            // errored send never strands the chat there.
            let round = RoundState::new(questions);
            dialogue
                .update(State::Playing {
                    round: round.clone(),
                })
                .await?;
            send_question(&bot, msg.chat.id, &round).await?;
        }
        Some(SHOW_LEADERBOARD) => {
            let entries = {
                let mut guard = store.lock().unwrap();
                Leaderboard::new(&mut *guard).load()
            };
            bot.send_message(msg.chat.id, format_leaderboard(&entries))
                .reply_markup(menu_keyboard())
                .await?;
        }
        Some(TOGGLE_NARRATION) => {
            let enabled = toggle_flag(&store, storage::NARRATION_KEY);
            let text = if enabled {
                "🗣 Narration on: I'll recap your score and lives after every answer."
            } else {
                "🤐 Narration off."
            };
            bot.send_message(msg.chat.id, text)
                .reply_markup(menu_keyboard())
                .await?;
        }
        Some(TOGGLE_SUSPENSE) => {
            let enabled = toggle_flag(&store, storage::SUSPENSE_KEY);
            let text = if enabled {
                "🥁 Suspense on: drum rolls before every reveal."
            } else {
                "😌 Suspense off."
            };
            bot.send_message(msg.chat.id, text)
                .reply_markup(menu_keyboard())
                .await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Please pick one of the options")
                .reply_markup(menu_keyboard())
                .await?;
        }
    }
    Ok(())
}

async fn generating(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    if msg.text() == Some(QUIT_GAME) {
        bot.send_message(msg.chat.id, "Back to the menu.")
            .reply_markup(menu_keyboard())
            .await?;
        dialogue.update(State::Menu).await?;
        return Ok(());
    }
    bot.send_message(
        msg.chat.id,
        "⏳ Still preparing your questions, hang tight...",
    )
    .await?;
    Ok(())
}

async fn playing(
    hinter: Arc<HintHelper>,
    store: SharedStore,
    bot: Bot,
    dialogue: QuizDialogue,
    mut round: RoundState,
    msg: Message,
) -> HandlerResult {
    match msg.text() {
        Some(HINT_HELP) => {
            if let Some(question) = round.use_hint() {
                bot.send_message(msg.chat.id, "💡 Asking the examiners...")
                    .await?;
                let advice = hinter.advise(&question).await;
                bot.send_message(msg.chat.id, format!("💡 Examiners' hint:\n\n{}", advice))
                    .reply_markup(question_keyboard(&round))
                    .await?;
            } else {
                bot.send_message(msg.chat.id, "You already used your hint this round.")
                    .await?;
            }
            dialogue.update(State::Playing { round }).await?;
        }
        Some(ELIMINATE_HELP) => {
            if round.use_eliminate_two().is_some() {
                bot.send_message(
                    msg.chat.id,
                    "✂️ Two incorrect options have been eliminated.",
                )
                .reply_markup(question_keyboard(&round))
                .await?;
            } else {
                bot.send_message(msg.chat.id, "You already used eliminate-two this round.")
                    .await?;
            }
            dialogue.update(State::Playing { round }).await?;
        }
        Some(SKIP_HELP) => {
            if round.use_skip() {
                if round.finished() {
                    finish_round(&store, &bot, &dialogue, &round, msg.chat.id).await?;
                } else {
                    bot.send_message(msg.chat.id, "⏭ Question skipped.").await?;
                    send_question(&bot, msg.chat.id, &round).await?;
                    dialogue.update(State::Playing { round }).await?;
                }
            } else {
                bot.send_message(msg.chat.id, "You already used your skip this round.")
                    .await?;
                dialogue.update(State::Playing { round }).await?;
            }
        }
        Some(QUIT_GAME) => {
            round.abandon();
            finish_round(&store, &bot, &dialogue, &round, msg.chat.id).await?;
        }
        Some(text) => {
            let picked = round
                .current_question()
                .and_then(|q| q.options.iter().position(|option| option == text));
            let Some(option) = picked else {
                bot.send_message(msg.chat.id, "Please pick one of the answer buttons")
                    .reply_markup(question_keyboard(&round))
                    .await?;
                dialogue.update(State::Playing { round }).await?;
                return Ok(());
            };

            let Some(result) = round.submit_answer(option) else {
                dialogue.update(State::Playing { round }).await?;
                return Ok(());
            };

            let (narration, suspense) = {
                let guard = store.lock().unwrap();
                (
                    storage::get_flag(&*guard, storage::NARRATION_KEY, true),
                    storage::get_flag(&*guard, storage::SUSPENSE_KEY, true),
                )
            };
            if suspense {
                bot.send_message(msg.chat.id, "🥁 Drum roll...").await?;
            }

            let feedback = if result.correct {
                "✅ Correct!".to_string()
            } else {
                match &result.correct_option {
                    Some(correct) => format!("❌ Wrong! The correct answer was: {}", correct),
                    None => "❌ Wrong!".to_string(),
                }
            };
            bot.send_message(msg.chat.id, feedback).await?;

            if narration {
                bot.send_message(
                    msg.chat.id,
                    format!(
                        "Your score is {} points. You have {} lives remaining.",
                        result.score, result.lives
                    ),
                )
                .await?;
            }

            if round.finished() {
                finish_round(&store, &bot, &dialogue, &round, msg.chat.id).await?;
            } else {
                round.advance();
                if round.finished() {
                    finish_round(&store, &bot, &dialogue, &round, msg.chat.id).await?;
                } else {
                    send_question(&bot, msg.chat.id, &round).await?;
                    dialogue.update(State::Playing { round }).await?;
                }
            }
        }
        None => {
            bot.send_message(msg.chat.id, "Please pick one of the answer buttons")
                .await?;
            dialogue.update(State::Playing { round }).await?;
        }
    }
    Ok(())
}

async fn finish_round(
    store: &SharedStore,
    bot: &Bot,
    dialogue: &QuizDialogue,
    round: &RoundState,
    chat_id: ChatId,
) -> HandlerResult {
    let summary = match round.outcome() {
        Some(Outcome::Victory) => format!(
            "🎉 Congratulations! You completed QA Millionaire with {} points!",
            round.score()
        ),
        Some(Outcome::Defeat) => format!(
            "💀 Game over on question {}! Your final score is {} points.",
            round.question_number(),
            round.score()
        ),
        Some(Outcome::CompletedViaSkip) => format!(
            "🏁 You skipped your way past the final question! Final score: {} points.",
            round.score()
        ),
        Some(Outcome::Abandoned) => format!(
            "🚪 Round abandoned. Your score was frozen at {} points.",
            round.score()
        ),
        // A round only finishes with an outcome set.
        None => format!("Round over. Final score: {} points.", round.score()),
    };
    bot.send_message(chat_id, summary).await?;

    let entries = {
        let mut guard = store.lock().unwrap();
        let name = guard
            .get(storage::PLAYER_NAME_KEY)
            .unwrap_or_else(|| "Anonymous".to_string());
        Leaderboard::new(&mut *guard).submit(&name, round.score())
    };
    bot.send_message(chat_id, format_leaderboard(&entries))
        .reply_markup(menu_keyboard())
        .await?;

    dialogue.update(State::Menu).await?;
    Ok(())
}

async fn send_question(bot: &Bot, chat_id: ChatId, round: &RoundState) -> HandlerResult {
    let Some(question) = round.current_question() else {
        return Ok(());
    };
    let text = format!(
        "Question {}/{} • {} • {} points\n\n{}",
        round.question_number(),
        round.total_questions(),
        question.difficulty.label(),
        question.points(),
        question.prompt
    );
    bot.send_message(chat_id, text)
        .reply_markup(question_keyboard(round))
        .await?;
    Ok(())
}

fn toggle_flag(store: &SharedStore, key: &str) -> bool {
    let mut guard = store.lock().unwrap();
    let enabled = !storage::get_flag(&*guard, key, true);
    storage::set_flag(&mut *guard, key, enabled);
    enabled
}

fn menu_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![
            KeyboardButton::new(START_GAME),
            KeyboardButton::new(SHOW_LEADERBOARD),
        ],
        vec![
            KeyboardButton::new(TOGGLE_NARRATION),
            KeyboardButton::new(TOGGLE_SUSPENSE),
        ],
    ])
}

fn question_keyboard(round: &RoundState) -> KeyboardMarkup {
    let mut rows: Vec<Vec<KeyboardButton>> = Vec::new();
    if let Some(question) = round.current_question() {
        for (index, option) in question.options.iter().enumerate() {
            if round.eliminated().contains(&index) {
                continue;
            }
            rows.push(vec![KeyboardButton::new(option.clone())]);
        }
    }

    let helps = round.helps();
    let mut help_row = Vec::new();
    if !helps.hint {
        help_row.push(KeyboardButton::new(HINT_HELP));
    }
    if !helps.eliminate_two {
        help_row.push(KeyboardButton::new(ELIMINATE_HELP));
    }
    if !helps.skip {
        help_row.push(KeyboardButton::new(SKIP_HELP));
    }
    if !help_row.is_empty() {
        rows.push(help_row);
    }
    rows.push(vec![KeyboardButton::new(QUIT_GAME)]);

    KeyboardMarkup::new(rows)
}

fn format_leaderboard(entries: &[leaderboard::LeaderboardEntry]) -> String {
    if entries.is_empty() {
        return "🏆 The leaderboard is still empty. Be the first!".to_string();
    }
    let mut lines = vec!["🏆 Top 10".to_string()];
    for (position, entry) in entries.iter().enumerate() {
        let medal = match position {
            0 => "🥇",
            1 => "🥈",
            2 => "🥉",
            _ => "▫️",
        };
        lines.push(format!(
            "{} {} — {} points ({})",
            medal, entry.name, entry.score, entry.date
        ));
    }
    lines.join("\n")
}

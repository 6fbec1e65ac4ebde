//! VOD Catalog Admin
//! Desktop console for organizing a VOD catalog: categories, content and file order

// Hide console window on Windows release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use std::time::Duration;

use eframe::egui;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vod_catalog_admin::category::CategoryTreeController;
use vod_catalog_admin::content::ContentCommand;
use vod_catalog_admin::files::FileView;
use vod_catalog_admin::models::*;
use vod_catalog_admin::ordering::OrderInput;
use vod_catalog_admin::pagination::PageCursor;
use vod_catalog_admin::prefs::{FilePreferences, Preferences};
use vod_catalog_admin::{
    ApiError, AppConfig, CatalogError, CatalogOrganizer, Fetch, FetchResult, HttpCatalogClient, Mutation,
};

/// Lines kept in the activity log
const LOG_LIMIT: usize = 500;

fn timestamp_now() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// Results sent back from worker threads
enum TaskResult {
    Fetched(FetchResult),
    Mutated {
        mutation: Mutation,
        result: Result<(), ApiError>,
    },
}

/// Everything the UI asked for during one frame; handled after drawing
enum UiAction {
    ReloadTree,
    SelectCategory(CategoryId),
    ToggleExpanded(CategoryId),
    Deselect,
    NewCategory,
    EditCategory(CategoryId),
    SaveCategory,
    DeleteCategory(CategoryId),
    OrderSiblings(Option<CategoryId>),
    SaveSiblingOrder,
    Search,
    GoToPage(i64),
    ToggleRow(ContentId),
    SelectAll(bool),
    DeleteSelected,
    OpenMove,
    ChooseDestination(CategoryId),
    ConfirmMove,
    CancelMove,
    NewContent,
    EditContent(ContentId),
    SaveContent,
    OpenFiles(ContentId),
    CloseFiles,
    FilesGoTo(i64),
    AskFullEdit,
    CancelFullEdit,
    EnterFullEdit,
    LeaveFullEdit,
    EditFileOrder(FileId, String),
    MoveFileRow(usize, usize),
    SaveFileOrder,
    NewFile,
    EditFile(FileId),
    SaveFile,
    DeleteFile(FileId),
    Confirm,
    CancelConfirm,
}

struct TreeRow {
    id: CategoryId,
    name: String,
    depth: usize,
    has_children: bool,
    expanded: bool,
}

fn collect_rows<P: Preferences>(
    tree: &CategoryTreeController<P>,
    nodes: &[CategoryNode],
    depth: usize,
    out: &mut Vec<TreeRow>,
) {
    for node in nodes {
        let expanded = tree.is_expanded(node.id());
        out.push(TreeRow {
            id: node.id(),
            name: node.name().to_string(),
            depth,
            has_children: !node.children.is_empty(),
            expanded,
        });
        if expanded {
            collect_rows(tree, &node.children, depth + 1, out);
        }
    }
}

struct CategoryForm {
    id: Option<CategoryId>,
    name: String,
    parent: Option<CategoryId>,
}

struct SiblingEditor {
    parent: Option<CategoryId>,
    /// (id, name, order text)
    rows: Vec<(CategoryId, String, String)>,
}

struct ContentForm {
    id: Option<ContentId>,
    draft: ContentDraft,
    poster: String,
}

struct FileForm {
    id: Option<FileId>,
    name: String,
    path: String,
}

struct AdminApp {
    config: AppConfig,
    client: HttpCatalogClient,
    organizer: CatalogOrganizer<FilePreferences>,
    task_sender: Sender<TaskResult>,
    task_receiver: Receiver<TaskResult>,
    pending_tasks: usize,

    status_message: String,
    console_log: Vec<String>,
    show_console: bool,

    category_form: Option<CategoryForm>,
    sibling_editor: Option<SiblingEditor>,
    content_form: Option<ContentForm>,
    file_form: Option<FileForm>,
    confirm: Option<(String, Mutation)>,
    full_edit_prompt: Option<String>,
}

impl AdminApp {
    fn new(config: AppConfig) -> Self {
        let (task_sender, task_receiver) = channel();
        let client = HttpCatalogClient::from_config(&config);
        let prefs = FilePreferences::open(FilePreferences::default_path());
        let organizer = CatalogOrganizer::new(prefs, &config);

        let mut app = Self {
            config,
            client,
            organizer,
            task_sender,
            task_receiver,
            pending_tasks: 0,
            status_message: "Ready".to_string(),
            console_log: Vec::new(),
            show_console: false,
            category_form: None,
            sibling_editor: None,
            content_form: None,
            file_form: None,
            confirm: None,
            full_edit_prompt: None,
        };
        app.log(&format!("[INFO] Catalog API: {}", app.client.base_url()));
        let fetch = app.organizer.load_tree();
        app.dispatch([fetch]);
        app
    }

    fn log(&mut self, message: &str) {
        let timestamp = timestamp_now();
        self.console_log.push(format!("[{}] {}", timestamp, message));
        // Keep last 500 lines
        if self.console_log.len() > LOG_LIMIT {
            self.console_log.remove(0);
        }
    }

    fn report(&mut self, err: CatalogError) {
        if err.is_validation() {
            self.log(&format!("[WARN] {}", err));
        } else {
            self.log(&format!("[ERROR] {}", err));
        }
        self.status_message = format!("Error: {}", err);
    }

    fn dispatch(&mut self, fetches: impl IntoIterator<Item = Fetch>) {
        for fetch in fetches {
            self.pending_tasks += 1;
            let client = self.client.clone();
            let sender = self.task_sender.clone();
            thread::spawn(move || {
                let result = fetch.run(&client);
                let _ = sender.send(TaskResult::Fetched(result));
            });
        }
    }

    /// Ask first when the mutation needs confirmation, else send it
    fn submit(&mut self, mutation: Mutation) {
        match mutation.prompt() {
            Some(prompt) => self.confirm = Some((prompt, mutation)),
            None => self.spawn_mutation(mutation),
        }
    }

    fn spawn_mutation(&mut self, mutation: Mutation) {
        self.status_message = format!("Working: {}...", mutation.describe());
        self.pending_tasks += 1;
        let client = self.client.clone();
        let sender = self.task_sender.clone();
        thread::spawn(move || {
            let result = mutation.perform(&client);
            let _ = sender.send(TaskResult::Mutated { mutation, result });
        });
    }

    fn process_results(&mut self) {
        while let Ok(task) = self.task_receiver.try_recv() {
            self.pending_tasks = self.pending_tasks.saturating_sub(1);
            match task {
                TaskResult::Fetched(result) => match self.organizer.apply(result) {
                    Ok(fetches) => self.dispatch(fetches),
                    Err(err) => self.report(err),
                },
                TaskResult::Mutated { mutation, result } => {
                    match self.organizer.finish(&mutation, result) {
                        Ok(fetches) => {
                            self.log(&format!("[INFO] Done: {}", mutation.describe()));
                            self.status_message = format!("Done: {}", mutation.describe());
                            self.dispatch(fetches);
                        }
                        Err(err) => self.report(err),
                    }
                }
            }
        }
    }

    fn handle(&mut self, action: UiAction) {
        match action {
            UiAction::ReloadTree => {
                let fetch = self.organizer.load_tree();
                self.dispatch([fetch]);
            }
            UiAction::SelectCategory(id) => match self.organizer.select_category(id) {
                Ok(fetches) => self.dispatch(fetches),
                Err(err) => self.report(err),
            },
            UiAction::ToggleExpanded(id) => self.organizer.tree_mut().toggle_expanded(id),
            UiAction::Deselect => self.organizer.deselect_category(),
            UiAction::NewCategory => {
                self.category_form = Some(CategoryForm {
                    id: None,
                    name: String::new(),
                    parent: self.organizer.tree().selected(),
                });
            }
            UiAction::EditCategory(id) => {
                if let Some(category) = self.organizer.tree().get(id) {
                    self.category_form = Some(CategoryForm {
                        id: Some(id),
                        name: category.name.clone(),
                        parent: category.parent_id,
                    });
                }
            }
            UiAction::SaveCategory => {
                let Some(form) = self.category_form.as_ref() else { return };
                let tree = self.organizer.tree();
                let command = match form.id {
                    None => tree.add_command(&form.name),
                    Some(id) => tree.update_command(id, &form.name, form.parent),
                };
                match command {
                    Ok(command) => {
                        self.category_form = None;
                        self.submit(Mutation::Category(command));
                    }
                    Err(err) => self.report(err),
                }
            }
            UiAction::DeleteCategory(id) => match self.organizer.tree().delete_command(id) {
                Ok(command) => self.submit(Mutation::Category(command)),
                Err(err) => self.report(err),
            },
            UiAction::OrderSiblings(parent) => {
                let rows = self
                    .organizer
                    .tree()
                    .siblings(parent)
                    .into_iter()
                    .map(|c| (c.id, c.name.clone(), c.display_order.map(|o| o.to_string()).unwrap_or_default()))
                    .collect();
                self.sibling_editor = Some(SiblingEditor { parent, rows });
            }
            UiAction::SaveSiblingOrder => {
                let Some(editor) = self.sibling_editor.as_ref() else { return };
                let edits: Vec<OrderInput<CategoryId>> = editor
                    .rows
                    .iter()
                    .map(|(id, _, order)| OrderInput::from_text(*id, order))
                    .collect();
                match self.organizer.tree().reorder_command(editor.parent, &edits) {
                    Ok(command) => {
                        self.sibling_editor = None;
                        self.submit(Mutation::Category(command));
                    }
                    Err(err) => self.report(err),
                }
            }
            UiAction::Search => {
                let fetch = self.organizer.submit_search();
                self.dispatch(fetch);
            }
            UiAction::GoToPage(page) => {
                let fetch = self.organizer.go_to_page(page);
                self.dispatch(fetch);
            }
            UiAction::ToggleRow(id) => {
                self.organizer.browser_mut().toggle(id);
            }
            UiAction::SelectAll(selected) => self.organizer.browser_mut().select_all_visible(selected),
            UiAction::DeleteSelected => match self.organizer.prepare_bulk_delete() {
                Ok(mutation) => self.submit(mutation),
                Err(err) => self.report(err),
            },
            UiAction::OpenMove => {
                if let Err(err) = self.organizer.open_move() {
                    self.report(err);
                }
            }
            UiAction::ChooseDestination(id) => self.organizer.mover_mut().choose(id),
            UiAction::ConfirmMove => match self.organizer.confirm_move() {
                Ok(mutation) => self.submit(mutation),
                Err(err) => self.report(err),
            },
            UiAction::CancelMove => self.organizer.mover_mut().cancel(),
            UiAction::NewContent => match self.organizer.browser().new_draft() {
                Ok(draft) => {
                    self.content_form = Some(ContentForm {
                        id: None,
                        draft,
                        poster: String::new(),
                    })
                }
                Err(err) => self.report(err),
            },
            UiAction::EditContent(id) => {
                if let Some(draft) = self.organizer.browser().edit_draft(id) {
                    let poster = draft.poster_path.clone().unwrap_or_default();
                    self.content_form = Some(ContentForm {
                        id: Some(id),
                        draft,
                        poster,
                    });
                }
            }
            UiAction::SaveContent => {
                let Some(form) = self.content_form.as_ref() else { return };
                let mut draft = form.draft.clone();
                let poster = form.poster.trim();
                draft.poster_path = (!poster.is_empty()).then(|| poster.to_string());
                let command = match form.id {
                    None => ContentCommand::create(draft),
                    Some(id) => ContentCommand::update(id, draft),
                };
                match command {
                    Ok(command) => {
                        self.content_form = None;
                        self.submit(Mutation::Content(command));
                    }
                    Err(err) => self.report(err),
                }
            }
            UiAction::OpenFiles(id) => match self.organizer.open_files(id) {
                Ok(fetch) => self.dispatch([fetch]),
                Err(err) => self.report(err),
            },
            UiAction::CloseFiles => {
                if self.organizer.files().is_some_and(|f| f.has_unsaved_changes()) {
                    self.log("[WARN] Closed file list with unsaved order changes");
                }
                self.organizer.close_files();
                self.file_form = None;
                self.full_edit_prompt = None;
            }
            UiAction::FilesGoTo(page) => {
                let fetch = self.organizer.files_go_to(page);
                self.dispatch(fetch);
            }
            UiAction::AskFullEdit => self.full_edit_prompt = self.organizer.full_edit_prompt(),
            UiAction::CancelFullEdit => self.full_edit_prompt = None,
            UiAction::EnterFullEdit => {
                self.full_edit_prompt = None;
                match self.organizer.enter_full_edit() {
                    Ok(fetch) => self.dispatch([fetch]),
                    Err(err) => self.report(err),
                }
            }
            UiAction::LeaveFullEdit => match self.organizer.leave_full_edit() {
                Ok(fetch) => self.dispatch([fetch]),
                Err(err) => self.report(err),
            },
            UiAction::EditFileOrder(id, text) => {
                if let Some(Err(err)) = self.organizer.files_mut().map(|f| f.edit_order(id, &text)) {
                    self.report(err);
                }
            }
            UiAction::MoveFileRow(from, to) => {
                if let Some(Err(err)) = self.organizer.files_mut().map(|f| f.move_row(from, to)) {
                    self.report(err);
                }
            }
            UiAction::SaveFileOrder => match self.organizer.save_file_order() {
                Ok(mutation) => self.submit(mutation),
                Err(err) => self.report(err),
            },
            UiAction::NewFile => {
                self.file_form = Some(FileForm {
                    id: None,
                    name: String::new(),
                    path: String::new(),
                });
            }
            UiAction::EditFile(id) => {
                let Some(files) = self.organizer.files() else { return };
                let file = match files.view() {
                    FileView::Paged { files, .. } => files.iter().find(|f| f.id == id),
                    FileView::FullEdit { committed, .. } => committed.iter().map(|r| &r.file).find(|f| f.id == id),
                };
                if let Some(file) = file {
                    self.file_form = Some(FileForm {
                        id: Some(id),
                        name: file.vod_file_name.clone(),
                        path: file.vod_file_path.clone(),
                    });
                }
            }
            UiAction::SaveFile => {
                let (Some(files), Some(form)) = (self.organizer.files(), self.file_form.as_ref()) else { return };
                let command = match form.id {
                    None => files.create_command(&form.name, &form.path),
                    Some(id) => files.update_command(id, &form.name, &form.path),
                };
                match command {
                    Ok(command) => {
                        self.file_form = None;
                        self.submit(Mutation::File(command));
                    }
                    Err(err) => self.report(err),
                }
            }
            UiAction::DeleteFile(id) => {
                let command = self.organizer.files().map(|f| f.delete_command(id));
                match command {
                    Some(Ok(command)) => self.submit(Mutation::File(command)),
                    Some(Err(err)) => self.report(err),
                    None => {}
                }
            }
            UiAction::Confirm => {
                if let Some((_, mutation)) = self.confirm.take() {
                    self.spawn_mutation(mutation);
                }
            }
            UiAction::CancelConfirm => self.confirm = None,
        }
    }

    fn show_pager(ui: &mut egui::Ui, cursor: &PageCursor, actions: &mut Vec<UiAction>, go: fn(i64) -> UiAction) {
        if cursor.total_pages <= 1 {
            return;
        }
        let group = cursor.group();
        ui.horizontal(|ui| {
            if ui.add_enabled(group.previous().is_some(), egui::Button::new("«")).clicked() {
                if let Some(page) = group.previous() {
                    actions.push(go(i64::from(page)));
                }
            }
            for page in group.pages() {
                if ui.selectable_label(page == cursor.page, (page + 1).to_string()).clicked() && page != cursor.page {
                    actions.push(go(i64::from(page)));
                }
            }
            if ui.add_enabled(group.next().is_some(), egui::Button::new("»")).clicked() {
                if let Some(page) = group.next() {
                    actions.push(go(i64::from(page)));
                }
            }
            ui.label(format!("{} total", cursor.total_elements));
        });
    }

    fn show_tree_panel(&mut self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        let tree = self.organizer.tree();
        let selected = tree.selected();
        let mut rows = Vec::new();
        collect_rows(tree, tree.tree(), 0, &mut rows);

        ui.horizontal(|ui| {
            ui.heading("Categories");
            if tree.is_loading() {
                ui.spinner();
            }
        });
        ui.horizontal_wrapped(|ui| {
            if ui.button("⟳ Reload").clicked() {
                actions.push(UiAction::ReloadTree);
            }
            if ui.button("➕ Add").clicked() {
                actions.push(UiAction::NewCategory);
            }
            if ui.add_enabled(selected.is_some(), egui::Button::new("Deselect")).clicked() {
                actions.push(UiAction::Deselect);
            }
        });
        ui.horizontal_wrapped(|ui| {
            if ui.button("Order top level").clicked() {
                actions.push(UiAction::OrderSiblings(None));
            }
            if let Some(id) = selected {
                if ui.button("Order children").clicked() {
                    actions.push(UiAction::OrderSiblings(Some(id)));
                }
                if ui.button("Edit").clicked() {
                    actions.push(UiAction::EditCategory(id));
                }
                if ui.button("Delete").clicked() {
                    actions.push(UiAction::DeleteCategory(id));
                }
            }
        });
        ui.separator();

        egui::ScrollArea::vertical().id_salt("category_tree").show(ui, |ui| {
            for row in &rows {
                ui.horizontal(|ui| {
                    ui.add_space(row.depth as f32 * 16.0);
                    if row.has_children {
                        let arrow = if row.expanded { "▾" } else { "▸" };
                        if ui.small_button(arrow).clicked() {
                            actions.push(UiAction::ToggleExpanded(row.id));
                        }
                    } else {
                        ui.add_space(18.0);
                    }
                    if ui.selectable_label(selected == Some(row.id), &row.name).clicked() {
                        actions.push(UiAction::SelectCategory(row.id));
                    }
                });
            }
        });
    }

    fn show_content_panel(&mut self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        let Some(category_id) = self.organizer.browser().category() else {
            ui.centered_and_justified(|ui| {
                ui.label("Select a category to browse its content");
            });
            return;
        };
        let category_name = self
            .organizer
            .tree()
            .get(category_id)
            .map(|c| c.name.clone())
            .unwrap_or_default();

        ui.horizontal(|ui| {
            ui.heading(&category_name);
            if self.organizer.browser().is_loading() {
                ui.spinner();
            }
        });

        ui.horizontal(|ui| {
            ui.label("Title:");
            let response = ui.text_edit_singleline(self.organizer.browser_mut().search_mut().input_mut());
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                actions.push(UiAction::Search);
            }
            if ui.button("🔍 Search").clicked() {
                actions.push(UiAction::Search);
            }
            if self.organizer.browser().search().is_pending() {
                ui.label(egui::RichText::new("(not applied)").weak());
            }
        });

        let browser = self.organizer.browser();
        let has_selection = !browser.selected_ids().is_empty();
        ui.horizontal(|ui| {
            if ui.button("➕ New").clicked() {
                actions.push(UiAction::NewContent);
            }
            if ui.add_enabled(has_selection, egui::Button::new("Move...")).clicked() {
                actions.push(UiAction::OpenMove);
            }
            if ui.add_enabled(has_selection, egui::Button::new("Delete")).clicked() {
                actions.push(UiAction::DeleteSelected);
            }
            ui.label(format!("{} selected", browser.selected_ids().len()));
        });
        ui.separator();

        let entries = browser.entries().to_vec();
        let mut all_selected = browser.all_visible_selected();
        egui::ScrollArea::vertical().id_salt("content_table").show(ui, |ui| {
            egui::Grid::new("content_grid")
                .num_columns(7)
                .striped(true)
                .spacing([12.0, 6.0])
                .show(ui, |ui| {
                    if ui.checkbox(&mut all_selected, "").changed() {
                        actions.push(UiAction::SelectAll(all_selected));
                    }
                    ui.strong("Title");
                    ui.strong("Poster");
                    ui.strong("Exposed");
                    ui.strong("Files");
                    ui.strong("Updated");
                    ui.label("");
                    ui.end_row();

                    for entry in &entries {
                        let mut checked = browser.is_selected(entry.id);
                        if ui.checkbox(&mut checked, "").changed() {
                            actions.push(UiAction::ToggleRow(entry.id));
                        }
                        ui.label(&entry.title);
                        ui.label(entry.poster_display_name().unwrap_or("-"));
                        ui.label(if entry.exposed { "Yes" } else { "No" });
                        ui.label(entry.file_count.map_or_else(|| "-".to_string(), |n| n.to_string()));
                        ui.label(entry.timestamp_display());
                        ui.horizontal(|ui| {
                            if ui.small_button("Edit").clicked() {
                                actions.push(UiAction::EditContent(entry.id));
                            }
                            if ui.small_button("Files").clicked() {
                                actions.push(UiAction::OpenFiles(entry.id));
                            }
                        });
                        ui.end_row();
                    }
                });
            if entries.is_empty() && !browser.is_loading() {
                ui.label("No content in this category");
            }
        });

        ui.separator();
        Self::show_pager(ui, browser.cursor(), actions, UiAction::GoToPage);
    }

    fn show_move_window(&mut self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        let mover = self.organizer.mover();
        if !mover.is_open() {
            return;
        }
        let rows = mover.destinations(self.organizer.tree().tree());
        let source = mover.source();
        let destination = mover.destination();
        let count = mover.ids().len();

        egui::Window::new("Move content")
            .collapsible(false)
            .resizable(true)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(format!("Move {} entries to:", count));
                ui.separator();
                egui::ScrollArea::vertical()
                    .id_salt("move_destinations")
                    .max_height(320.0)
                    .show(ui, |ui| {
                        for row in &rows {
                            ui.horizontal(|ui| {
                                ui.add_space(row.depth as f32 * 16.0);
                                let current = source == Some(row.id);
                                let label = if current { format!("{} (current)", row.name) } else { row.name.clone() };
                                ui.add_enabled_ui(!current, |ui| {
                                    if ui.selectable_label(destination == Some(row.id), label).clicked() {
                                        actions.push(UiAction::ChooseDestination(row.id));
                                    }
                                });
                            });
                        }
                    });
                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        actions.push(UiAction::CancelMove);
                    }
                    if ui.add_enabled(destination.is_some(), egui::Button::new("Move")).clicked() {
                        actions.push(UiAction::ConfirmMove);
                    }
                });
            });
    }

    fn show_files_window(&mut self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        let Some(files) = self.organizer.files() else { return };
        let title = format!("Files: {}", files.title());
        let loading = files.is_loading();
        let unsaved = files.has_unsaved_changes();

        egui::Window::new(title)
            .id(egui::Id::new("files_window"))
            .collapsible(false)
            .resizable(true)
            .default_size([620.0, 480.0])
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if files.is_full_edit() {
                        if ui.button("Back to pages").clicked() {
                            actions.push(UiAction::LeaveFullEdit);
                        }
                        if ui.add_enabled(!loading, egui::Button::new("💾 Save order")).clicked() {
                            actions.push(UiAction::SaveFileOrder);
                        }
                        if unsaved {
                            ui.label(egui::RichText::new("unsaved changes").color(egui::Color32::YELLOW));
                        }
                    } else {
                        if ui.button("Edit order").clicked() {
                            actions.push(UiAction::AskFullEdit);
                        }
                        if ui.button("➕ Add file").clicked() {
                            actions.push(UiAction::NewFile);
                        }
                    }
                    if loading {
                        ui.spinner();
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Close").clicked() {
                            actions.push(UiAction::CloseFiles);
                        }
                    });
                });
                ui.separator();

                match files.view() {
                    FileView::Paged { cursor, .. } => {
                        let rows = files.paged_rows();
                        egui::ScrollArea::vertical().id_salt("file_pages").max_height(360.0).show(ui, |ui| {
                            egui::Grid::new("file_page_grid").num_columns(4).striped(true).show(ui, |ui| {
                                ui.strong("#");
                                ui.strong("Name");
                                ui.strong("Path");
                                ui.label("");
                                ui.end_row();
                                for (number, file) in &rows {
                                    ui.label(number.to_string());
                                    ui.label(&file.vod_file_name);
                                    ui.label(&file.vod_file_path);
                                    ui.horizontal(|ui| {
                                        if ui.small_button("Edit").clicked() {
                                            actions.push(UiAction::EditFile(file.id));
                                        }
                                        if ui.small_button("Delete").clicked() {
                                            actions.push(UiAction::DeleteFile(file.id));
                                        }
                                    });
                                    ui.end_row();
                                }
                            });
                        });
                        ui.separator();
                        Self::show_pager(ui, cursor, actions, UiAction::FilesGoTo);
                    }
                    FileView::FullEdit { draft, .. } => {
                        let last = draft.len().saturating_sub(1);
                        egui::ScrollArea::vertical().id_salt("file_edit").max_height(400.0).show(ui, |ui| {
                            egui::Grid::new("file_edit_grid").num_columns(3).striped(true).show(ui, |ui| {
                                ui.strong("Order");
                                ui.strong("Name");
                                ui.label("");
                                ui.end_row();
                                for (index, row) in draft.iter().enumerate() {
                                    let mut order = row.order.clone();
                                    if ui.add(egui::TextEdit::singleline(&mut order).desired_width(60.0)).changed() {
                                        actions.push(UiAction::EditFileOrder(row.file.id, order));
                                    }
                                    ui.label(&row.file.vod_file_name);
                                    ui.horizontal(|ui| {
                                        if ui.add_enabled(index > 0, egui::Button::new("⬆").small()).clicked() {
                                            actions.push(UiAction::MoveFileRow(index, index - 1));
                                        }
                                        if ui.add_enabled(index < last, egui::Button::new("⬇").small()).clicked() {
                                            actions.push(UiAction::MoveFileRow(index, index + 1));
                                        }
                                    });
                                    ui.end_row();
                                }
                            });
                        });
                    }
                }
            });
    }

    fn show_forms(&mut self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        if let Some(form) = self.category_form.as_mut() {
            let outline = self.organizer.tree().outline();
            let mut close = false;
            egui::Window::new(if form.id.is_some() { "Edit category" } else { "New category" })
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.label("Name:");
                        ui.text_edit_singleline(&mut form.name);
                    });
                    if form.id.is_some() {
                        let parent_name = form
                            .parent
                            .and_then(|p| outline.iter().find(|r| r.id == p))
                            .map_or_else(|| "(top level)".to_string(), |r| r.name.clone());
                        egui::ComboBox::from_label("Parent")
                            .selected_text(parent_name)
                            .show_ui(ui, |ui| {
                                ui.selectable_value(&mut form.parent, None, "(top level)");
                                for row in &outline {
                                    let label = format!("{}{}", "  ".repeat(row.depth), row.name);
                                    ui.selectable_value(&mut form.parent, Some(row.id), label);
                                }
                            });
                    } else if let Some(parent) = form.parent.and_then(|p| outline.iter().find(|r| r.id == p)) {
                        ui.label(format!("Under: {}", parent.name));
                    }
                    ui.horizontal(|ui| {
                        if ui.button("Cancel").clicked() {
                            close = true;
                        }
                        if ui.button("Save").clicked() {
                            actions.push(UiAction::SaveCategory);
                        }
                    });
                });
            if close {
                self.category_form = None;
            }
        }

        if let Some(editor) = self.sibling_editor.as_mut() {
            let mut close = false;
            egui::Window::new("Category order")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label("Lower numbers come first; blanks go last.");
                    egui::Grid::new("sibling_order_grid").num_columns(2).show(ui, |ui| {
                        for (_, name, order) in editor.rows.iter_mut() {
                            ui.add(egui::TextEdit::singleline(order).desired_width(50.0));
                            ui.label(name.as_str());
                            ui.end_row();
                        }
                    });
                    ui.horizontal(|ui| {
                        if ui.button("Cancel").clicked() {
                            close = true;
                        }
                        if ui.button("Save").clicked() {
                            actions.push(UiAction::SaveSiblingOrder);
                        }
                    });
                });
            if close {
                self.sibling_editor = None;
            }
        }

        if let Some(form) = self.content_form.as_mut() {
            let mut close = false;
            egui::Window::new(if form.id.is_some() { "Edit content" } else { "New content" })
                .collapsible(false)
                .resizable(true)
                .show(ctx, |ui| {
                    egui::Grid::new("content_form_grid").num_columns(2).show(ui, |ui| {
                        ui.label("Title:");
                        ui.text_edit_singleline(&mut form.draft.title);
                        ui.end_row();
                        ui.label("Description:");
                        ui.text_edit_multiline(&mut form.draft.description);
                        ui.end_row();
                        ui.label("Poster path:");
                        ui.text_edit_singleline(&mut form.poster);
                        ui.end_row();
                        ui.label("Exposed:");
                        ui.checkbox(&mut form.draft.exposed, "");
                        ui.end_row();
                    });
                    ui.horizontal(|ui| {
                        if ui.button("Cancel").clicked() {
                            close = true;
                        }
                        if ui.button("Save").clicked() {
                            actions.push(UiAction::SaveContent);
                        }
                    });
                });
            if close {
                self.content_form = None;
            }
        }

        if let Some(form) = self.file_form.as_mut() {
            let mut close = false;
            egui::Window::new(if form.id.is_some() { "Edit file" } else { "Add file" })
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    egui::Grid::new("file_form_grid").num_columns(2).show(ui, |ui| {
                        ui.label("Name:");
                        ui.text_edit_singleline(&mut form.name);
                        ui.end_row();
                        ui.label("Path:");
                        ui.text_edit_singleline(&mut form.path);
                        ui.end_row();
                    });
                    ui.horizontal(|ui| {
                        if ui.button("Cancel").clicked() {
                            close = true;
                        }
                        if ui.button("Save").clicked() {
                            actions.push(UiAction::SaveFile);
                        }
                    });
                });
            if close {
                self.file_form = None;
            }
        }

        if let Some(prompt) = self.full_edit_prompt.as_ref() {
            egui::Window::new("Edit file order")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(prompt.as_str());
                    ui.horizontal(|ui| {
                        if ui.button("Cancel").clicked() {
                            actions.push(UiAction::CancelFullEdit);
                        }
                        if ui.button("Load all").clicked() {
                            actions.push(UiAction::EnterFullEdit);
                        }
                    });
                });
        }

        if let Some((prompt, _)) = self.confirm.as_ref() {
            egui::Window::new("⚠ Confirm")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.add_space(6.0);
                    ui.label(egui::RichText::new(prompt.as_str()).strong());
                    ui.add_space(6.0);
                    ui.horizontal(|ui| {
                        if ui.button("Cancel").clicked() {
                            actions.push(UiAction::CancelConfirm);
                        }
                        if ui
                            .button(egui::RichText::new("Confirm").color(egui::Color32::from_rgb(200, 80, 80)))
                            .clicked()
                        {
                            actions.push(UiAction::Confirm);
                        }
                    });
                });
        }
    }

    fn show_console(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.strong("Activity");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("🗑 Clear").clicked() {
                    self.console_log.clear();
                    self.console_log.push(format!("[{}] Console cleared", timestamp_now()));
                }
            });
        });
        egui::ScrollArea::vertical()
            .id_salt("console")
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for line in &self.console_log {
                    let color = if line.contains("[ERROR]") {
                        egui::Color32::RED
                    } else if line.contains("[WARN]") {
                        egui::Color32::YELLOW
                    } else if line.contains("[INFO]") {
                        egui::Color32::LIGHT_BLUE
                    } else {
                        egui::Color32::GRAY
                    };
                    ui.label(egui::RichText::new(line).monospace().color(color));
                }
            });
    }
}

impl eframe::App for AdminApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Process background task results (non-blocking)
        self.process_results();
        if self.pending_tasks > 0 {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        let mut actions = Vec::new();

        egui::TopBottomPanel::bottom("bottom_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status_message);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.toggle_value(&mut self.show_console, "Activity log");
                    ui.label(egui::RichText::new(&self.config.api_base_url).weak());
                });
            });
        });

        if self.show_console {
            egui::TopBottomPanel::bottom("console_panel")
                .resizable(true)
                .default_height(160.0)
                .show(ctx, |ui| self.show_console(ui));
        }

        egui::SidePanel::left("category_panel")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| self.show_tree_panel(ui, &mut actions));

        egui::CentralPanel::default().show(ctx, |ui| self.show_content_panel(ui, &mut actions));

        self.show_move_window(ctx, &mut actions);
        self.show_files_window(ctx, &mut actions);
        self.show_forms(ctx, &mut actions);

        for action in actions {
            self.handle(action);
        }
    }
}

fn main() -> Result<(), eframe::Error> {
    let config = AppConfig::load();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    info!(api = %config.api_base_url, "starting catalog console");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 720.0])
            .with_min_inner_size([900.0, 520.0]),
        vsync: true,
        hardware_acceleration: eframe::HardwareAcceleration::Preferred,
        ..Default::default()
    };

    eframe::run_native(
        "VOD Catalog Admin",
        options,
        Box::new(|_cc| Ok(Box::new(AdminApp::new(config)))),
    )
}
